use super::*;
use crate::clock::ManualClock;
use crate::security::Argon2SecretProvider;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

fn t0() -> DateTime<Utc> { DateTime::from_timestamp_millis(1_760_000_000_000).unwrap() }

fn service_with(key: u8, clock: Arc<ManualClock>) -> TokenService {
    let secrets = Arc::new(Argon2SecretProvider::new(vec![key; 32]).unwrap());
    TokenService::new(secrets, clock, Duration::hours(1))
}

#[test]
fn issued_token_verifies_to_its_subject() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = service_with(1, clock);
    let tok = svc.issue("alice").unwrap();
    assert_eq!(tok.subject, "alice");
    assert_eq!(tok.issued_at, t0());
    assert_eq!(tok.expires_at, t0() + Duration::hours(1));
    assert_eq!(svc.verify(tok.as_str()), Ok("alice".to_string()));
    let decoded = svc.decode(tok.as_str()).unwrap();
    assert_eq!(decoded, tok);
}

#[test]
fn issued_token_is_a_standard_hs256_jwt() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = service_with(1, clock);
    let tok = svc.issue("alice").unwrap();
    assert_eq!(tok.as_str().split('.').count(), 3);

    let header = jsonwebtoken::decode_header(tok.as_str()).unwrap();
    assert_eq!(header.alg, Algorithm::HS256);

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    let data = jsonwebtoken::decode::<serde_json::Value>(tok.as_str(), &DecodingKey::from_secret(&[1u8; 32]), &validation).unwrap();
    assert_eq!(data.claims["sub"], "alice");
    assert_eq!(data.claims["iat"], t0().timestamp());
    assert_eq!(data.claims["exp"], t0().timestamp() + 3600);
}

#[test]
fn sub_second_clock_is_truncated_to_whole_seconds() {
    let clock = Arc::new(ManualClock::new(t0() + Duration::milliseconds(750)));
    let svc = service_with(1, clock);
    let tok = svc.issue_with_ttl("alice", Duration::seconds(10)).unwrap();
    assert_eq!(tok.issued_at, t0());
    assert_eq!(tok.expires_at, t0() + Duration::seconds(10));
}

#[test]
fn accepted_strictly_before_expiry_and_rejected_from_expiry_on() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = service_with(1, clock.clone());
    let ttl = Duration::seconds(90);
    let tok = svc.issue_with_ttl("alice", ttl).unwrap();

    for offset_ms in [0, 1, 45_000, 89_999] {
        clock.set(t0() + Duration::milliseconds(offset_ms));
        assert_eq!(svc.verify(tok.as_str()), Ok("alice".to_string()), "offset {offset_ms}ms");
    }
    for offset_ms in [90_000, 90_001, 3_600_000] {
        clock.set(t0() + Duration::milliseconds(offset_ms));
        assert_eq!(svc.verify(tok.as_str()), Err(TokenError::Expired), "offset {offset_ms}ms");
    }
}

#[test]
fn lifetime_past_the_calendar_is_an_error_not_a_panic() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = service_with(1, clock);
    let err = svc.issue_with_ttl("alice", Duration::seconds(1_000_000_000_000_000)).unwrap_err();
    assert_eq!(err.code_str(), "token_ttl");
    assert_eq!(err.http_status(), 500);
}

#[test]
fn token_is_not_consumed_by_verification() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = service_with(1, clock);
    let tok = svc.issue("alice").unwrap();
    for _ in 0..5 {
        assert!(svc.verify(tok.as_str()).is_ok());
    }
}

#[test]
fn token_from_another_key_is_a_bad_signature() {
    let clock = Arc::new(ManualClock::new(t0()));
    let ours = service_with(1, clock.clone());
    let theirs = service_with(2, clock);
    let tok = theirs.issue("alice").unwrap();
    assert_eq!(ours.verify(tok.as_str()), Err(TokenError::BadSignature));
}

#[test]
fn tampered_payload_is_a_bad_signature() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = service_with(1, clock);
    let tok = svc.issue("alice").unwrap();
    let parts: Vec<&str> = tok.as_str().split('.').collect();
    let forged_claims = serde_json::json!({"sub": "mallory", "iat": t0().timestamp(), "exp": t0().timestamp() + 86_400});
    let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
    let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
    assert_eq!(svc.verify(&forged), Err(TokenError::BadSignature));
}

#[test]
fn unsigned_algorithm_is_refused() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = service_with(1, clock);
    let tok = svc.issue("alice").unwrap();
    let parts: Vec<&str> = tok.as_str().split('.').collect();
    let none_header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    assert_eq!(svc.verify(&format!("{none_header}.{}.", parts[1])), Err(TokenError::BadSignature));
}

#[test]
fn expired_and_forged_reports_bad_signature_first() {
    let clock = Arc::new(ManualClock::new(t0()));
    let other = service_with(2, clock.clone());
    let svc = service_with(1, clock.clone());
    let tok = other.issue_with_ttl("alice", Duration::seconds(1)).unwrap();
    clock.advance(Duration::hours(2));
    assert_eq!(svc.verify(tok.as_str()), Err(TokenError::BadSignature));
}

#[test]
fn malformed_tokens_are_bad_signatures() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = service_with(1, clock);
    for junk in ["", "no-dot", ".", "abc.", ".abc", "a.b.c", "!!!.???.###"] {
        assert_eq!(svc.verify(junk), Err(TokenError::BadSignature), "input {junk:?}");
    }
}

#[test]
fn library_expiry_maps_to_expired() {
    let err = jsonwebtoken::errors::Error::from(ErrorKind::ExpiredSignature);
    assert_eq!(TokenError::from(err), TokenError::Expired);
    let err = jsonwebtoken::errors::Error::from(ErrorKind::InvalidSignature);
    assert_eq!(TokenError::from(err), TokenError::BadSignature);
}
