//! Property tests for sysconfig document editing.

use proptest::prelude::*;

use staticport::{Document, ValueSyntax};

fn sysconfig_like_text() -> impl Strategy<Value = String> {
    let line = prop_oneof![
        Just(String::new()),
        proptest::string::string_regex("# [ -~]{0,30}").unwrap(),
        proptest::string::string_regex("[A-Z_]{1,12}=\"[a-z0-9 -]{0,12}\"").unwrap(),
        proptest::string::string_regex("[ -~]{0,30}").unwrap(),
    ];
    proptest::collection::vec(line, 0..12).prop_map(|lines| {
        let mut text = lines.join("\n");
        text.push('\n');
        text
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: parsing and rendering without edits is the identity, for
    /// any text (not just well-formed sysconfig files).
    #[test]
    fn property_untouched_document_round_trips(text in "(?s).{0,400}") {
        let doc = Document::parse(&text);
        prop_assert_eq!(doc.render(), text);
    }

    /// PROPERTY: after setting a key, every line not carrying that key is
    /// unchanged, and the key reads back with the new value.
    #[test]
    fn property_set_touches_only_the_target_key(
        text in sysconfig_like_text(),
        port in 1u16..=65535,
    ) {
        let mut doc = Document::parse(&text);
        doc.set("MOUNTD_PORT", &port.to_string());

        let port_str = port.to_string();
        prop_assert_eq!(doc.get("MOUNTD_PORT"), Some(port_str.as_str()));

        let keep = |l: &&str| !l.trim_start().starts_with("MOUNTD_PORT");
        let before: Vec<&str> = text.lines().filter(keep).collect();
        let rendered = doc.render();
        let after: Vec<&str> = rendered.lines().filter(keep).collect();
        prop_assert_eq!(before, after);
    }

    /// PROPERTY: a rendered flag value always scans back to the same port.
    #[test]
    fn property_flag_syntax_round_trips(port in 1u16..=65535) {
        for syntax in [ValueSyntax::Bare, ValueSyntax::Flag("-p"), ValueSyntax::Flag("--port")] {
            let rendered = syntax.render(port);
            prop_assert_eq!(syntax.scan(&rendered), Ok(Some(port)));
        }
    }

    /// PROPERTY: scanning arbitrary values never panics.
    #[test]
    fn property_scan_never_panics(value in ".{0,60}") {
        let _ = ValueSyntax::Bare.scan(&value);
        let _ = ValueSyntax::Flag("-p").scan(&value);
    }
}
