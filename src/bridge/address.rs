/**
 * The backend answers `load_local_ip` with either the address of the device
 * on the local network, or a human readable failure message. Nothing in the
 * reply marks which of the two it is, so the panels decide by shape: a reply
 * that looks like an address literal unlocks the controls, anything else is
 * shown verbatim as the diagnostic.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reachability {
    /// The device answered with a usable address.
    Reachable(String),
    /// The raw reply, displayed as-is in the panel.
    Unreachable(String),
}

impl Reachability {
    pub fn from_reply(reply: String) -> Reachability {
        if is_address_literal(&reply) {
            Reachability::Reachable(reply)
        }
        else {
            Reachability::Unreachable(reply)
        }
    }
}

/**
 * True for dotted IPv4 literals (four groups of 1-3 digits) and full-form
 * IPv6 literals (eight groups of 1-4 hex digits). Compressed IPv6 forms
 * ("fe80::1") do not pass; the device always reports the expanded form.
 * This is a shape check, not a validity check: "999.999.999.999" passes.
 */
pub fn is_address_literal(value: &str) -> bool {
    is_ipv4_literal(value) || is_ipv6_literal(value)
}

fn is_ipv4_literal(value: &str) -> bool {
    let mut groups = 0;

    for group in value.split('.') {
        groups += 1;
        if groups > 4 || group.is_empty() || group.len() > 3 {
            return false;
        }
        if !group.bytes().all(|byte| byte.is_ascii_digit()) {
            return false;
        }
    }

    groups == 4
}

fn is_ipv6_literal(value: &str) -> bool {
    let mut groups = 0;

    for group in value.split(':') {
        groups += 1;
        if groups > 8 || group.is_empty() || group.len() > 4 {
            return false;
        }
        if !group.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return false;
        }
    }

    groups == 8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_dotted_ipv4() {
        assert!(is_address_literal("192.168.1.10"));
        assert!(is_address_literal("10.0.0.1"));
        // shape only; group values are not range checked
        assert!(is_address_literal("999.999.999.999"));
    }

    #[test]
    fn rejects_malformed_ipv4() {
        assert!(!is_address_literal("192.168.1"));
        assert!(!is_address_literal("192.168.1.10.5"));
        assert!(!is_address_literal("192.168.1."));
        assert!(!is_address_literal("1921.68.1.10"));
        assert!(!is_address_literal("192.168.one.10"));
        assert!(!is_address_literal(""));
    }

    #[test]
    fn accepts_full_form_ipv6() {
        assert!(is_address_literal("fe80:0:0:0:0:0:0:1"));
        assert!(is_address_literal("2001:0db8:85a3:0000:0000:8a2e:0370:7334"));
        assert!(is_address_literal("FE80:CAFE:0:0:0:0:0:1"));
    }

    #[test]
    fn rejects_compressed_ipv6() {
        assert!(!is_address_literal("fe80::1"));
        assert!(!is_address_literal("::1"));
        assert!(!is_address_literal("2001:db8::8a2e:370:7334"));
    }

    #[test]
    fn failure_messages_stay_unreachable() {
        let reply = "Failed to find a QTShock on the network! Error: lookup failed".to_string();
        assert_eq!(
            Reachability::from_reply(reply.clone()),
            Reachability::Unreachable(reply)
        );

        assert_eq!(
            Reachability::from_reply("192.168.1.10".to_string()),
            Reachability::Reachable("192.168.1.10".to_string())
        );
    }
}
