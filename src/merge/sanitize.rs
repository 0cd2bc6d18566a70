/// Characters that cannot appear in a directory name on common filesystems.
const RESERVED_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Turns a classname into a directory name by replacing each reserved character with `_`.
///
/// Every other character is left as-is. The mapping is not injective: `a/b` and `a:b`
/// both become `a_b`.
///
/// # Examples
///
/// ```rust
/// use furni_catalog::merge::sanitize_classname;
/// assert_eq!(sanitize_classname("a/b:c"), "a_b_c");
/// ```
pub fn sanitize_classname(classname: &str) -> String {
    classname
        .chars()
        .map(|c| if RESERVED_CHARS.contains(&c) { '_' } else { c })
        .collect()
}
