//! Effect name to naming token.

/// Plugin format prefixes hosts put in front of effect names.
const FORMAT_PREFIXES: &[&str] = &["VST3:", "VST:", "AU:", "CLAP:", "JS:", "LV2:", "DX:"];

/// Turns a host effect name into the token recorded in output names.
pub trait TokenFormatter {
    fn token_for(&self, effect_name: &str) -> String;
}

/// Strips the plugin format prefix and a trailing `(Vendor)` suffix.
///
/// `"VST3: Pro-Q 3 (FabFilter)"` becomes `"Pro-Q 3"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTokenFormatter;

impl TokenFormatter for DefaultTokenFormatter {
    fn token_for(&self, effect_name: &str) -> String {
        let mut name = effect_name.trim();

        if let Some(rest) = FORMAT_PREFIXES.iter().find_map(|p| strip_prefix_ci(name, p)) {
            name = rest.trim_start();
        }

        if name.ends_with(')') {
            if let Some(open) = name.rfind('(') {
                let stripped = name[..open].trim_end();
                if !stripped.is_empty() {
                    name = stripped;
                }
            }
        }

        name.to_string()
    }
}

impl<F: Fn(&str) -> String> TokenFormatter for F {
    fn token_for(&self, effect_name: &str) -> String {
        self(effect_name)
    }
}

fn strip_prefix_ci<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let head = name.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &name[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_formatter_strips_prefix_and_vendor() {
        let fmt = DefaultTokenFormatter;
        assert_eq!(fmt.token_for("VST3: Pro-Q 3 (FabFilter)"), "Pro-Q 3");
        assert_eq!(fmt.token_for("AU: AUDelay (Apple)"), "AUDelay");
        assert_eq!(fmt.token_for("JS: 1175 Compressor"), "1175 Compressor");
        assert_eq!(fmt.token_for("clap: Surge XT (Surge Synth Team)"), "Surge XT");
        assert_eq!(fmt.token_for("  ReaComp  "), "ReaComp");
    }

    #[test]
    fn test_default_formatter_keeps_bare_parenthesis() {
        let fmt = DefaultTokenFormatter;
        assert_eq!(fmt.token_for("(Mono)"), "(Mono)");
        assert_eq!(fmt.token_for("VSTi"), "VSTi");
    }

    #[test]
    fn test_closure_formatter() {
        let upper = |name: &str| name.to_uppercase();
        assert_eq!(upper.token_for("eq"), "EQ");
    }
}
