use std::fmt::Display;

use serde::{Deserialize, Serialize};

macro_rules! string_name {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new<S: Into<String>>(name: S) -> Self {
                $name(name.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                $name::new(name)
            }
        }
    };
}

string_name!(
    /// Name of a field in the response (alias or field name).
    FieldName
);
string_name!(RelName);
string_name!(ComputedFieldName);
string_name!(NativeQueryName);
string_name!(
    /// Name of a remote schema or a source in the metadata.
    SourceName
);
