//! Constants shared across the crate.

/// Default project file looked up in the working directory.
pub const PROJECT_FILE: &str = "weld.json";

/// Suffix inserted before the extension of a minified artifact.
pub const MINIFIED_SUFFIX: &str = "min";

/// Extension appended to a compressed artifact.
pub const COMPRESSED_EXT: &str = "gz";

/// Extension appended to an assembled artifact's definition object.
pub const ADO_EXT: &str = "ado.json";

pub const CREATED_MARKER: &str = "// created:";
pub const FILE_START_MARKER: &str = "// file (start):";
pub const FILE_END_MARKER: &str = "// file (end)";
