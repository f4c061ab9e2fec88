use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_key: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.map_or_else(SecretString::default, SecretString::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(None);
        assert_eq!(args.api_key.expose_secret(), "");

        let args = GlobalArgs::new(Some("sekret".to_string()));
        assert_eq!(args.api_key.expose_secret(), "sekret");
    }

    #[test]
    fn test_debug_redacts_the_key() {
        let args = GlobalArgs::new(Some("sekret".to_string()));
        let debug = format!("{args:?}");
        assert!(!debug.contains("sekret"));
    }
}
