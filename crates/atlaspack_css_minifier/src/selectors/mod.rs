pub mod mergeable;
pub mod overlap;
pub mod specificity;
pub mod tidy;

pub use self::mergeable::is_mergeable;
pub use self::overlap::specificities_overlap;
pub use self::specificity::{specificity, Specificity, SpecificityCache};
pub use self::tidy::{tidy_rule_duplicates, tidy_selector};
