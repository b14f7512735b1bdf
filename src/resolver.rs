//! Virtual path grammar.
//!
//! ```text
//! "/"                         -> the three category directories
//! "/<category>"               -> distinct grouping values
//! "/<category>/<value>"       -> virtual filenames for that value
//! "/<category>/<value>/<file>"-> a single track lookup
//! ```
//!
//! An unknown name at depth 1 is a directory that exists conceptually but
//! lists empty; anything deeper than three segments is simply not there.

use crate::config::CategoryDirs;
use crate::track::Category;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VirtualPath<'a> {
    Root,
    CategoryDir(Category),
    /// Depth-1 name that is not one of the category dirs.
    UnknownDir(&'a str),
    ValueDir(Category, &'a str),
    Entry(Category, &'a str, &'a str),
    Invalid,
}

/// Parse a slash path against the configured category directory names.
/// Pure: no store access, no allocation.
pub fn resolve<'a>(dirs: &CategoryDirs, path: &'a str) -> VirtualPath<'a> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        [] => VirtualPath::Root,
        [first] => match dirs.category_of(first) {
            Some(cat) => VirtualPath::CategoryDir(cat),
            None => VirtualPath::UnknownDir(first),
        },
        [first, value] => match dirs.category_of(first) {
            Some(cat) => VirtualPath::ValueDir(cat, value),
            None => VirtualPath::Invalid,
        },
        [first, value, name] => match dirs.category_of(first) {
            Some(cat) => VirtualPath::Entry(cat, value, name),
            None => VirtualPath::Invalid,
        },
        _ => VirtualPath::Invalid,
    }
}

/// Append a child name to a virtual directory path.
pub fn join(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirs() -> CategoryDirs {
        CategoryDirs::default()
    }

    #[test]
    fn root_and_categories() {
        assert_eq!(resolve(&dirs(), "/"), VirtualPath::Root);
        assert_eq!(resolve(&dirs(), ""), VirtualPath::Root);
        assert_eq!(resolve(&dirs(), "/Por_Ano"), VirtualPath::CategoryDir(Category::Year));
        assert_eq!(resolve(&dirs(), "/Por_Album"), VirtualPath::CategoryDir(Category::Album));
        assert_eq!(
            resolve(&dirs(), "/Por_Artista"),
            VirtualPath::CategoryDir(Category::Artist)
        );
    }

    #[test]
    fn unknown_depth_one_is_a_conceptual_empty_dir() {
        assert_eq!(resolve(&dirs(), "/Por_Genero"), VirtualPath::UnknownDir("Por_Genero"));
    }

    #[test]
    fn value_and_entry_depths() {
        assert_eq!(
            resolve(&dirs(), "/Por_Album/Kind of Blue"),
            VirtualPath::ValueDir(Category::Album, "Kind of Blue")
        );
        assert_eq!(
            resolve(&dirs(), "/Por_Album/Kind of Blue/1 -- So What.mp3"),
            VirtualPath::Entry(Category::Album, "Kind of Blue", "1 -- So What.mp3")
        );
    }

    #[test]
    fn deep_or_unknown_paths_are_invalid() {
        assert_eq!(resolve(&dirs(), "/Por_Album/a/b/c"), VirtualPath::Invalid);
        assert_eq!(resolve(&dirs(), "/Nope/value"), VirtualPath::Invalid);
        assert_eq!(resolve(&dirs(), "/Nope/value/file.mp3"), VirtualPath::Invalid);
    }

    #[test]
    fn repeated_separators_collapse() {
        assert_eq!(
            resolve(&dirs(), "//Por_Ano//1959/"),
            VirtualPath::ValueDir(Category::Year, "1959")
        );
    }

    #[test]
    fn join_builds_child_paths() {
        assert_eq!(join("/", "Por_Ano"), "/Por_Ano");
        assert_eq!(join("/Por_Ano", "1959"), "/Por_Ano/1959");
    }
}
