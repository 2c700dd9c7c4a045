/// How a [`JsonField`](crate::JsonField) reads its value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetrieveOptions {
    /// When true, a JSON string is parsed into the declared type if the
    /// value is not already of that type.
    pub parse_if_string: bool,
    /// When true (and `parse_if_string` applied), the parsed value replaces
    /// the string in the container.
    pub replace_cast_in_map: bool,
}

impl RetrieveOptions {
    /// Parse strings, leave the container untouched.
    pub fn parse() -> Self {
        Self {
            parse_if_string: true,
            replace_cast_in_map: false,
        }
    }

    /// Parse strings and write the parsed value back.
    pub fn parse_and_replace() -> Self {
        Self {
            parse_if_string: true,
            replace_cast_in_map: true,
        }
    }
}

/// Limits applied when loading schema documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Maximum number of schemas loaded from a directory.
    pub max_schemas_from_directory: usize,
    /// Maximum bytes allowed per schema file loaded from a directory.
    pub max_schema_file_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_schemas_from_directory: 256,
            max_schema_file_size: 256 * 1024,
        }
    }
}
