use super::specificity::SpecificityCache;

/// Whether any selector on the left has exactly the same specificity as any
/// selector on the right.
pub fn specificities_overlap<L, R>(left: &[L], right: &[R], cache: &mut SpecificityCache) -> bool
where
  L: AsRef<str>,
  R: AsRef<str>,
{
  let right = right
    .iter()
    .map(|selector| cache.get(selector.as_ref()))
    .collect::<Vec<_>>();

  left.iter().any(|selector| {
    let specificity = cache.get(selector.as_ref());
    right.contains(&specificity)
  })
}
