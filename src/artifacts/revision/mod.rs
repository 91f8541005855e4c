pub mod revision;

/// Tokens git would read as an option, or that cannot survive as one argument
pub const INVALID_REVISION_REGEX: &str = r"^-|[\x00-\x20\x7f]";
pub const PARENT_REGEX: &str = r"^(.+)\^$";
pub const ANCESTOR_REGEX: &str = r"^(.+)\~(\d+)$";
pub const EMPTY_TREE_ALIAS: &str = "EMPTY_TREE";
pub const REF_ALIASES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "@" => "HEAD",
    "PRE_INIT_COMMIT" => EMPTY_TREE_ALIAS,
};
