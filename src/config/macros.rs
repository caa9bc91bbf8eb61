/// `config_struct!` declares a config section and its defaults together
///
/// ```ignore
/// config_struct! {
///     pub struct ScannerConfig {
///         interval_secs: u64 = 300,
///         batch_limit: usize = 50,
///     }
/// }
/// ```
///
/// Expands to a struct with public fields, a `Default` impl built from the
/// listed values, and serde derives with `#[serde(default)]` so that a TOML
/// file only needs to mention the fields it changes.
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident: $ty:ty = $default:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $( $field: $default, )*
                }
            }
        }
    };
}
