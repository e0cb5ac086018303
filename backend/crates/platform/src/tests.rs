//! Cross-module properties of the primitives
//! Sampled with seeded RNGs so failures reproduce.

#[cfg(test)]
mod password_properties {
    use crate::password::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    const CASES: usize = 128;
    const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    /// Replace the character at a random position with a different alphanumeric
    fn tweak(rng: &mut StdRng, s: &str) -> String {
        let mut bytes = s.as_bytes().to_vec();
        let pos = rng.random_range(0..bytes.len());
        let original = bytes[pos];
        while bytes[pos] == original {
            bytes[pos] = ALPHANUMERIC[rng.random_range(0..ALPHANUMERIC.len())];
        }
        String::from_utf8(bytes).unwrap()
    }

    fn sample_pair(rng: &mut StdRng) -> (String, String) {
        let password_len = rng.random_range(1..40);
        let password = generate_salt_with(rng, password_len);
        let salt = generate_salt_with(rng, DEFAULT_SALT_LENGTH);
        (password, salt)
    }

    #[test]
    fn test_hash_is_deterministic_for_samples() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..CASES {
            let (password, salt) = sample_pair(&mut rng);
            assert_eq!(hash(&password, &salt), hash(&password, &salt));
        }
    }

    #[test]
    fn test_verify_accepts_own_hash() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..CASES {
            let (password, salt) = sample_pair(&mut rng);
            let digest = hash(&password, &salt);
            assert!(verify_password(&password, &digest, &salt));
        }
    }

    #[test]
    fn test_verify_rejects_tampered_password() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..CASES {
            let (password, salt) = sample_pair(&mut rng);
            let digest = hash(&password, &salt);
            let tampered = tweak(&mut rng, &password);
            assert!(
                !verify_password(&tampered, &digest, &salt),
                "{password:?} -> {tampered:?} collided under {salt:?}"
            );
        }
    }

    #[test]
    fn test_verify_rejects_tampered_salt() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..CASES {
            let (password, salt) = sample_pair(&mut rng);
            let digest = hash(&password, &salt);
            let tampered = tweak(&mut rng, &salt);
            assert!(!verify_password(&password, &digest, &tampered));
        }
    }

    #[test]
    fn test_verify_rejects_tampered_hash() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..CASES {
            let (password, salt) = sample_pair(&mut rng);
            let mut digest = hash(&password, &salt).into_bytes();
            let pos = rng.random_range(0..digest.len());
            digest[pos] = if digest[pos] == b'0' { b'1' } else { b'0' };
            let digest = String::from_utf8(digest).unwrap();
            assert!(!verify_password(&password, &digest, &salt));
        }
    }
}

#[cfg(test)]
mod token_properties {
    use crate::token::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;
    const BASE64URL: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

    fn sample_claims() -> Claims {
        let mut claims = Claims::new();
        claims.insert("id".into(), json!("64f1c2aa9b1e4d0001abcdef"));
        claims.insert("role".into(), json!("cashier"));
        claims.insert("scopes".into(), json!(["pos:read", "pos:write"]));
        claims
    }

    #[test]
    fn test_every_signature_character_is_checked() {
        let token = sign_at(&sample_claims(), b"topsecret", SignOptions::expires_in(3600), NOW);
        let sig_start = token.rfind('.').unwrap() + 1;

        for pos in sig_start..token.len() {
            let original = token.as_bytes()[pos] as char;
            let replacement = BASE64URL.chars().find(|&c| c != original).unwrap();
            let mut forged = token.clone();
            forged.replace_range(pos..pos + 1, &replacement.to_string());
            assert!(
                verify_at(&forged, b"topsecret", NOW).is_none(),
                "signature edit at {pos} accepted"
            );
        }
    }

    #[test]
    fn test_payload_edit_is_rejected() {
        let token = sign_at(&sample_claims(), b"topsecret", SignOptions::default(), NOW);
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();

        let mut escalated = sample_claims();
        escalated.insert("role".into(), json!("admin"));
        let resigned_elsewhere = sign_at(&escalated, b"attacker", SignOptions::default(), NOW);
        parts[1] = resigned_elsewhere.split('.').nth(1).unwrap().to_string();

        assert!(verify_at(&parts.join("."), b"topsecret", NOW).is_none());
    }

    #[test]
    fn test_resigned_with_other_secret_is_rejected() {
        let token = sign_at(&sample_claims(), b"other-secret", SignOptions::expires_in(60), NOW);
        assert!(verify_at(&token, b"topsecret", NOW).is_none());
        assert!(verify_at(&token, b"other-secret", NOW).is_some());
    }

    #[test]
    fn test_roundtrip_with_wall_clock() {
        let token = sign(&sample_claims(), b"topsecret", SignOptions::expires_in(3600));
        let verified = verify(&token, b"topsecret").unwrap();

        let mut expected = sample_claims();
        expected.insert(EXP_CLAIM.into(), verified[EXP_CLAIM].clone());
        assert_eq!(verified, expected);
        assert!(verified[EXP_CLAIM].as_i64().unwrap() > NOW);
    }

    #[test]
    fn test_negative_expiry_with_wall_clock() {
        let token = sign(&sample_claims(), b"topsecret", SignOptions::expires_in(-1));
        assert!(verify(&token, b"topsecret").is_none());
        assert!(decode(&token).is_some());
    }
}

#[cfg(test)]
mod composition {
    use crate::password::compose_hash;
    use crate::token::{SignOptions, verify_at, sign_at};
    use kernel::id::{generate_id, is_valid_id};
    use serde_json::json;

    #[test]
    fn test_register_then_login_flow() {
        let user_id = generate_id();
        let credential = compose_hash("MySecure#Pass2024!");

        // Later request presents the password again
        assert!(credential.verify("MySecure#Pass2024!"));

        let mut claims = crate::token::Claims::new();
        claims.insert("id".into(), json!(user_id.as_str()));
        let token = sign_at(&claims, b"session-secret", SignOptions::expires_in(60), 1_000);

        let verified = verify_at(&token, b"session-secret", 1_030).unwrap();
        let subject = verified["id"].as_str().unwrap();
        assert_eq!(is_valid_id(subject).unwrap(), user_id);
    }
}
