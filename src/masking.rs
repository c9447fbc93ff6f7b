/// Masks the info part of a `kind:info` contact string for public views.
///
/// Everything after the second `:` is discarded. Strings without a colon are
/// returned untouched.
pub fn mask_contact(contact: &str) -> String {
    let mut pieces = contact.split(':');
    let kind = match pieces.next() {
        Some(kind) => kind,
        None => return contact.to_string(),
    };
    let info = match pieces.next() {
        Some(info) => info,
        None => return contact.to_string(),
    };
    let chars: Vec<char> = info.chars().collect();
    if chars.len() <= 3 {
        return format!("{kind}:***");
    }
    let (prefix_len, suffix_len) = match kind.to_lowercase().as_str() {
        "qq" => (3, 4),
        "wx" | "微信" => (2, 2),
        _ => (2, 1),
    };
    let prefix: String = chars.iter().take(prefix_len).collect();
    let suffix: String = chars[chars.len() - suffix_len..].iter().collect();
    format!("{kind}:{prefix}****{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_qq_numbers() {
        assert_eq!(mask_contact("qq:123456789"), "qq:123****6789");
    }

    #[test]
    fn masks_wechat_handles() {
        assert_eq!(mask_contact("wx:abcdwxyz"), "wx:ab****yz");
        assert_eq!(mask_contact("微信:abcdwxyz"), "微信:ab****yz");
    }

    #[test]
    fn masks_unknown_kinds_with_default_widths() {
        assert_eq!(mask_contact("tel:12345"), "tel:12****5");
    }

    #[test]
    fn short_infos_collapse_to_stars() {
        assert_eq!(mask_contact("x:12"), "x:***");
        assert_eq!(mask_contact("qq:123"), "qq:***");
        assert_eq!(mask_contact("abc:"), "abc:***");
    }

    #[test]
    fn strings_without_a_colon_pass_through() {
        assert_eq!(mask_contact("noColon"), "noColon");
        assert_eq!(mask_contact("张三"), "张三");
    }

    #[test]
    fn kind_matching_ignores_case_but_keeps_the_original() {
        assert_eq!(mask_contact("QQ:123456789"), "QQ:123****6789");
        assert_eq!(mask_contact("Wx:abcdwxyz"), "Wx:ab****yz");
    }

    #[test]
    fn short_qq_numbers_may_overlap_prefix_and_suffix() {
        assert_eq!(mask_contact("qq:1234"), "qq:123****1234");
    }

    #[test]
    fn everything_past_the_second_colon_is_dropped() {
        assert_eq!(mask_contact("mail:someone:example.com"), "mail:so****e");
        assert_eq!(mask_contact("tel:12345:67890"), "tel:12****5");
    }

    #[test]
    fn multibyte_infos_are_sliced_by_character() {
        assert_eq!(mask_contact("wx:微信号测试"), "wx:微信****测试");
    }
}
