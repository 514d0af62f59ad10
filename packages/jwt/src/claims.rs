//! JWT claims and builder with compile-time validation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, marker::PhantomData};
use uuid::Uuid;

use crate::error::{TokenError, TokenResult};
use crate::validation::ValidationOptions;

/// Typestate markers for builder pattern.
pub mod ts {
    /// Marker for a field that has been set.
    pub struct Set;
    /// Marker for a field that has not been set.
    pub struct Unset;
}

/// Token payload.
///
/// `jti`, `sub`, `iss` and `exp` are required for a token to verify.
/// Unknown fields survive a round trip through `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Token id.
    #[serde(default)]
    pub jti: Uuid,
    /// Subject, usually a user or device id.
    #[serde(default)]
    pub sub: String,
    /// Expiry (unix seconds).
    pub exp: i64,
    /// Issued-at (unix seconds).
    #[serde(default)]
    pub iat: i64,
    /// Not before (unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    /// Issuer.
    #[serde(default)]
    pub iss: String,
    /// Audience.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Tenant the subject belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    /// Token was issued to a user.
    #[serde(default, skip_serializing_if = "is_false")]
    pub user: bool,
    /// Token was issued to a device.
    #[serde(default, skip_serializing_if = "is_false")]
    pub device: bool,
    /// Authorization scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scp: Option<String>,
    /// Tenant plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    /// Tenant is on a trial.
    #[serde(default, skip_serializing_if = "is_false")]
    pub trial: bool,
    /// Custom data.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(v: &bool) -> bool {
    !*v
}

impl Claims {
    /// Start building claims.
    #[must_use]
    pub fn builder() -> ClaimsBuilder {
        ClaimsBuilder::new()
    }

    /// Whether `exp` has passed at `now`, ignoring leeway.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }

    /// Structural and temporal checks at verification time `now`.
    ///
    /// Missing required claims, `exp` before `iat` and a future `nbf` are
    /// [`TokenError::Invalid`]; a passed `exp` is [`TokenError::Expired`].
    pub fn validate(&self, now: DateTime<Utc>, options: &ValidationOptions) -> TokenResult<()> {
        if self.iss.is_empty() || self.sub.is_empty() || self.jti.is_nil() {
            return Err(TokenError::Invalid);
        }
        if self.exp < self.iat {
            return Err(TokenError::Invalid);
        }

        let now = now.timestamp();
        let leeway = options.leeway_seconds();

        if options.validate_nbf {
            if let Some(nbf) = self.nbf {
                if nbf > now.saturating_add(leeway) {
                    return Err(TokenError::Invalid);
                }
            }
        }

        if now > self.exp.saturating_add(leeway) {
            return Err(TokenError::Expired);
        }

        Ok(())
    }
}

struct Draft {
    jti: Uuid,
    sub: String,
    exp: i64,
    iat: i64,
    nbf: Option<i64>,
    iss: String,
    aud: Option<String>,
    tenant: Option<String>,
    user: bool,
    device: bool,
    scp: Option<String>,
    plan: Option<String>,
    trial: bool,
    extra: HashMap<String, Value>,
}

/// Compile-time checked builder for JWT claims.
///
/// Issuer, subject and expiry must be set before `build` is callable.
/// Issued-at defaults to the time the builder was created and `jti` to a
/// random UUID.
pub struct ClaimsBuilder<Iss = ts::Unset, Sub = ts::Unset, Exp = ts::Unset> {
    draft: Draft,
    _phantom: PhantomData<(Iss, Sub, Exp)>,
}

impl ClaimsBuilder {
    /// Create a new claims builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            draft: Draft {
                jti: Uuid::new_v4(),
                sub: String::new(),
                exp: 0,
                iat: Utc::now().timestamp(),
                nbf: None,
                iss: String::new(),
                aud: None,
                tenant: None,
                user: false,
                device: false,
                scp: None,
                plan: None,
                trial: false,
                extra: HashMap::new(),
            },
            _phantom: PhantomData,
        }
    }
}

impl Default for ClaimsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<Iss, Sub, Exp> ClaimsBuilder<Iss, Sub, Exp> {
    fn transition<I, S, E>(self) -> ClaimsBuilder<I, S, E> {
        ClaimsBuilder {
            draft: self.draft,
            _phantom: PhantomData,
        }
    }
}

impl<Sub, Exp> ClaimsBuilder<ts::Unset, Sub, Exp> {
    /// Set the issuer (iss) claim.
    #[must_use]
    pub fn issuer(mut self, iss: impl Into<String>) -> ClaimsBuilder<ts::Set, Sub, Exp> {
        self.draft.iss = iss.into();
        self.transition()
    }
}

impl<Iss, Exp> ClaimsBuilder<Iss, ts::Unset, Exp> {
    /// Set the subject (sub) claim.
    #[must_use]
    pub fn subject(mut self, sub: impl Into<String>) -> ClaimsBuilder<Iss, ts::Set, Exp> {
        self.draft.sub = sub.into();
        self.transition()
    }
}

impl<Iss, Sub> ClaimsBuilder<Iss, Sub, ts::Unset> {
    /// Set the expiration time relative to now.
    #[must_use]
    pub fn expires_in(mut self, dur: Duration) -> ClaimsBuilder<Iss, Sub, ts::Set> {
        self.draft.exp = (Utc::now() + dur).timestamp();
        self.transition()
    }

    /// Set an absolute expiration time.
    #[must_use]
    pub fn expires_at(mut self, exp: DateTime<Utc>) -> ClaimsBuilder<Iss, Sub, ts::Set> {
        self.draft.exp = exp.timestamp();
        self.transition()
    }
}

impl<Iss, Sub, Exp> ClaimsBuilder<Iss, Sub, Exp> {
    /// Override the issued-at time.
    #[must_use]
    pub fn issued_at(mut self, iat: DateTime<Utc>) -> Self {
        self.draft.iat = iat.timestamp();
        self
    }

    /// Set the JWT ID (jti) claim.
    #[must_use]
    pub fn jwt_id(mut self, jti: Uuid) -> Self {
        self.draft.jti = jti;
        self
    }

    /// Set the not-before (nbf) claim.
    #[must_use]
    pub fn not_before(mut self, nbf: DateTime<Utc>) -> Self {
        self.draft.nbf = Some(nbf.timestamp());
        self
    }

    /// Set the audience (aud) claim.
    #[must_use]
    pub fn audience(mut self, aud: impl Into<String>) -> Self {
        self.draft.aud = Some(aud.into());
        self
    }

    /// Scope the token to a tenant.
    #[must_use]
    pub fn tenant(mut self, tenant: impl Into<String>) -> Self {
        self.draft.tenant = Some(tenant.into());
        self
    }

    /// Set the authorization scope (scp) claim.
    #[must_use]
    pub fn scope(mut self, scp: impl Into<String>) -> Self {
        self.draft.scp = Some(scp.into());
        self
    }

    /// Mark the token as issued to a user.
    #[must_use]
    pub fn user(mut self) -> Self {
        self.draft.user = true;
        self
    }

    /// Mark the token as issued to a device.
    #[must_use]
    pub fn device(mut self) -> Self {
        self.draft.device = true;
        self
    }

    /// Set the tenant plan.
    #[must_use]
    pub fn plan(mut self, plan: impl Into<String>) -> Self {
        self.draft.plan = Some(plan.into());
        self
    }

    /// Mark the tenant as on a trial.
    #[must_use]
    pub fn trial(mut self, trial: bool) -> Self {
        self.draft.trial = trial;
        self
    }

    /// Add a custom claim.
    #[must_use]
    pub fn claim(mut self, k: impl Into<String>, v: Value) -> Self {
        self.draft.extra.insert(k.into(), v);
        self
    }
}

impl ClaimsBuilder<ts::Set, ts::Set, ts::Set> {
    /// Build the claims. All required fields must be set.
    #[must_use]
    pub fn build(self) -> Claims {
        let d = self.draft;
        Claims {
            jti: d.jti,
            sub: d.sub,
            exp: d.exp,
            iat: d.iat,
            nbf: d.nbf,
            iss: d.iss,
            aud: d.aud,
            tenant: d.tenant,
            user: d.user,
            device: d.device,
            scp: d.scp,
            plan: d.plan,
            trial: d.trial,
            extra: d.extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(exp_in: Duration) -> Claims {
        Claims::builder()
            .issuer("useradm")
            .subject("user-1")
            .expires_in(exp_in)
            .tenant("t1")
            .user()
            .build()
    }

    #[test]
    fn test_builder_sets_required_fields() {
        let claims = claims(Duration::hours(1));
        assert_eq!(claims.iss, "useradm");
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.tenant.as_deref(), Some("t1"));
        assert!(claims.user);
        assert!(!claims.device);
        assert!(!claims.jti.is_nil());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_valid_claims() {
        let claims = claims(Duration::hours(1));
        assert_eq!(claims.validate(Utc::now(), &ValidationOptions::default()), Ok(()));
    }

    #[test]
    fn test_expired_claims() {
        let claims = claims(Duration::hours(1));
        let later = Utc::now() + Duration::hours(2);
        assert!(claims.is_expired_at(later));
        assert_eq!(
            claims.validate(later, &ValidationOptions::default()),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_leeway_extends_expiry() {
        let claims = claims(Duration::hours(1));
        let later = Utc::now() + Duration::minutes(61);
        let options = ValidationOptions::default().with_leeway(Duration::minutes(5));
        assert_eq!(claims.validate(later, &options), Ok(()));
    }

    #[test]
    fn test_missing_required_claims_are_invalid() {
        let base = claims(Duration::hours(1));
        let now = Utc::now();
        let options = ValidationOptions::default();

        let mut c = base.clone();
        c.iss.clear();
        assert_eq!(c.validate(now, &options), Err(TokenError::Invalid));

        let mut c = base.clone();
        c.sub.clear();
        assert_eq!(c.validate(now, &options), Err(TokenError::Invalid));

        let mut c = base;
        c.jti = Uuid::nil();
        assert_eq!(c.validate(now, &options), Err(TokenError::Invalid));
    }

    #[test]
    fn test_missing_claims_win_over_expiry() {
        let mut c = claims(Duration::hours(1));
        c.sub.clear();
        let later = Utc::now() + Duration::hours(2);
        assert_eq!(
            c.validate(later, &ValidationOptions::default()),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_expiry_before_issue_is_invalid() {
        let now = Utc::now();
        let c = Claims::builder()
            .issuer("useradm")
            .subject("user-1")
            .expires_at(now - Duration::hours(1))
            .issued_at(now)
            .build();
        assert_eq!(
            c.validate(now - Duration::hours(2), &ValidationOptions::default()),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_not_before() {
        let now = Utc::now();
        let c = Claims::builder()
            .issuer("useradm")
            .subject("user-1")
            .expires_in(Duration::hours(2))
            .not_before(now + Duration::hours(1))
            .build();
        assert_eq!(
            c.validate(now, &ValidationOptions::default()),
            Err(TokenError::Invalid)
        );
        let lenient = ValidationOptions::default().validate_not_before(false);
        assert_eq!(c.validate(now, &lenient), Ok(()));
        assert_eq!(
            c.validate(now + Duration::minutes(61), &ValidationOptions::default()),
            Ok(())
        );
    }

    #[test]
    fn test_wire_names() -> Result<(), serde_json::Error> {
        let c = Claims::builder()
            .issuer("useradm")
            .subject("device-9")
            .expires_in(Duration::hours(1))
            .device()
            .scope("mender.*")
            .claim("role", json!("admin"))
            .build();
        let value = serde_json::to_value(&c)?;
        assert_eq!(value["iss"], "useradm");
        assert_eq!(value["sub"], "device-9");
        assert_eq!(value["scp"], "mender.*");
        assert_eq!(value["device"], true);
        assert_eq!(value["role"], "admin");
        assert!(value.get("user").is_none());
        assert!(value.get("tenant").is_none());
        assert!(value.get("nbf").is_none());
        Ok(())
    }

    #[test]
    fn test_unknown_fields_are_kept() -> Result<(), serde_json::Error> {
        let c = claims(Duration::hours(1));
        let mut value = serde_json::to_value(&c)?;
        value["addons"] = json!(["troubleshoot"]);
        let parsed: Claims = serde_json::from_value(value)?;
        assert_eq!(parsed.extra.get("addons"), Some(&json!(["troubleshoot"])));
        assert_eq!(parsed.sub, c.sub);
        Ok(())
    }

    #[test]
    fn test_missing_expiry_does_not_deserialize() {
        let parsed = serde_json::from_value::<Claims>(json!({
            "jti": Uuid::new_v4(),
            "sub": "user-1",
            "iss": "useradm",
            "iat": 1,
        }));
        assert!(parsed.is_err());
    }
}
