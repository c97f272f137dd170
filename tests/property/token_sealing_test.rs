//! Property-based tests for token sealing.
//!
//! Any UTF-8 token sealed with a key opens to the same token with that key,
//! and the sealed form never contains the token itself.

use dotpush::services::crypto_service::{CryptoService, CryptoServiceTrait};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sealed_token_opens_to_original(token in "[a-zA-Z0-9_]{8,64}", extra in "\\PC{0,16}") {
        let service = CryptoService::new();
        let key = vec![42u8; 32];
        let secret = format!("{}{}", token, extra);

        let sealed = service.seal_to_string(&secret, &key).unwrap();
        prop_assert!(!sealed.contains(&token));
        prop_assert_eq!(service.open_from_string(&sealed, &key).unwrap(), secret);
    }

    #[test]
    fn sealed_token_does_not_open_with_other_key(token in "[a-z0-9]{8,40}", byte in 0u8..42) {
        let service = CryptoService::new();
        let sealed = service.seal_to_string(&token, &[42u8; 32]).unwrap();
        prop_assert!(service.open_from_string(&sealed, &[byte; 32]).is_err());
    }
}

#[test]
fn derived_key_opens_what_it_sealed() {
    let service = CryptoService::new();
    let key = service.derive_key("dotpush", b"salt-salt-salt").unwrap();
    let sealed = service.seal_to_string("gho_abc", &key).unwrap();
    assert_eq!(service.open_from_string(&sealed, &key).unwrap(), "gho_abc");
}
