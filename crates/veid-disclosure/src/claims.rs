//! # Claim Types and Parameters
//!
//! [`ClaimType`] is a closed sum type. Every dispatch on it (policy level,
//! proof kind, lower bound, generation, verification) is an exhaustive
//! `match`, so adding a claim is a compile error until every site handles
//! it.
//!
//! [`ClaimParameters`] replaces an untyped parameter map with one optional,
//! typed slot per parameterized claim. Parameters are validated against the
//! requested claim set when a request is created and again whenever they
//! are read back.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use veid_core::CountryCode;
use veid_zkp::membership::MAX_SET_SIZE;
use veid_zkp::ProofKind;

use crate::error::DisclosureError;

/// A narrow fact a subject can prove about themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    AgeOver18,
    AgeOver21,
    AgeOver25,
    CountryResident,
    HumanVerified,
    TrustScoreAbove,
    EmailVerified,
    SmsVerified,
    DomainVerified,
    BiometricVerified,
}

/// Minimum verification level a claim requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationLevel {
    /// Any tier above unverified.
    Basic = 1,
    /// Standard or premium tier.
    Standard = 2,
}

impl ClaimType {
    /// Every claim type, in canonical order.
    pub const ALL: [Self; 10] = [
        Self::AgeOver18,
        Self::AgeOver21,
        Self::AgeOver25,
        Self::CountryResident,
        Self::HumanVerified,
        Self::TrustScoreAbove,
        Self::EmailVerified,
        Self::SmsVerified,
        Self::DomainVerified,
        Self::BiometricVerified,
    ];

    /// Wire identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AgeOver18 => "age_over_18",
            Self::AgeOver21 => "age_over_21",
            Self::AgeOver25 => "age_over_25",
            Self::CountryResident => "country_resident",
            Self::HumanVerified => "human_verified",
            Self::TrustScoreAbove => "trust_score_above",
            Self::EmailVerified => "email_verified",
            Self::SmsVerified => "sms_verified",
            Self::DomainVerified => "domain_verified",
            Self::BiometricVerified => "biometric_verified",
        }
    }

    /// Policy level the subject's tier must reach.
    pub fn min_level(&self) -> VerificationLevel {
        match self {
            Self::HumanVerified | Self::EmailVerified | Self::SmsVerified | Self::DomainVerified => {
                VerificationLevel::Basic
            }
            Self::AgeOver18
            | Self::AgeOver21
            | Self::AgeOver25
            | Self::CountryResident
            | Self::BiometricVerified
            | Self::TrustScoreAbove => VerificationLevel::Standard,
        }
    }

    /// Proof kind used to prove this claim.
    pub fn proof_kind(&self) -> ProofKind {
        match self {
            Self::AgeOver18 | Self::AgeOver21 | Self::AgeOver25 | Self::TrustScoreAbove => {
                ProofKind::Range
            }
            Self::CountryResident => ProofKind::SetMembership,
            Self::HumanVerified
            | Self::EmailVerified
            | Self::SmsVerified
            | Self::DomainVerified
            | Self::BiometricVerified => ProofKind::PedersenKnowledge,
        }
    }

    /// Hardcoded lower bound of the age tiers.
    pub fn age_lower_bound(&self) -> Option<u64> {
        match self {
            Self::AgeOver18 => Some(18),
            Self::AgeOver21 => Some(21),
            Self::AgeOver25 => Some(25),
            Self::CountryResident
            | Self::HumanVerified
            | Self::TrustScoreAbove
            | Self::EmailVerified
            | Self::SmsVerified
            | Self::DomainVerified
            | Self::BiometricVerified => None,
        }
    }

    /// Domain label bound into this claim's proof transcript.
    pub fn proof_domain(&self) -> String {
        format!("veid:sdr:{}:{}", self.proof_kind(), self.as_str())
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimType {
    type Err = DisclosureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DisclosureError::InvalidClaimType(format!("unknown claim type {s:?}")))
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Parameters of `TrustScoreAbove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreThresholdParams {
    /// Public lower bound on the composite score, in `[0, 100]`.
    pub threshold: u32,
}

/// Parameters of `CountryResident`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidencyParams {
    /// Country the subject is expected to assert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<CountryCode>,
    /// Countries the relying party accepts. Empty means `{country}`.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub allowed: BTreeSet<CountryCode>,
}

/// Typed parameters of a request, one slot per parameterized claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClaimParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<ScoreThresholdParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residency: Option<ResidencyParams>,
}

impl ClaimParameters {
    /// Parameters requiring a score of at least `threshold`.
    pub fn with_score_threshold(mut self, threshold: u32) -> Self {
        self.score_threshold = Some(ScoreThresholdParams { threshold });
        self
    }

    /// Parameters accepting residency in any of `allowed`.
    pub fn with_allowed_countries(mut self, allowed: impl IntoIterator<Item = CountryCode>) -> Self {
        let residency = self.residency.get_or_insert_with(ResidencyParams::default);
        residency.allowed.extend(allowed);
        self
    }

    /// Check the parameters against the requested claims.
    ///
    /// `TrustScoreAbove` needs a threshold in `[0, 100]`; parameters for
    /// claims that are not requested are rejected.
    pub fn validate_for(&self, claims: &BTreeSet<ClaimType>) -> Result<(), DisclosureError> {
        let wants_score = claims.contains(&ClaimType::TrustScoreAbove);
        match (&self.score_threshold, wants_score) {
            (Some(p), true) if p.threshold > 100 => {
                return Err(DisclosureError::InvalidClaimType(format!(
                    "trust_score_above threshold {} outside [0, 100]",
                    p.threshold
                )))
            }
            (Some(_), false) => {
                return Err(DisclosureError::InvalidProofRequest(
                    "score threshold given without a trust_score_above claim".into(),
                ))
            }
            (None, true) => {
                return Err(DisclosureError::InvalidClaimType(
                    "trust_score_above requires a score threshold".into(),
                ))
            }
            _ => {}
        }

        if let Some(residency) = &self.residency {
            if !claims.contains(&ClaimType::CountryResident) {
                return Err(DisclosureError::InvalidProofRequest(
                    "residency parameters given without a country_resident claim".into(),
                ));
            }
            if residency.allowed.len() > MAX_SET_SIZE {
                return Err(DisclosureError::InvalidClaimType(format!(
                    "country_resident allows at most {MAX_SET_SIZE} countries"
                )));
            }
            if let Some(country) = &residency.country {
                if !residency.allowed.is_empty() && !residency.allowed.contains(country) {
                    return Err(DisclosureError::InvalidClaimType(format!(
                        "country_resident country {country} is outside its own allowed set"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Score threshold, if set.
    pub fn score_threshold(&self) -> Option<u32> {
        self.score_threshold.map(|p| p.threshold)
    }

    /// Allowed residency set after defaulting: the explicit set, else the
    /// expected country, else `fallback`.
    pub fn effective_allowed(&self, fallback: Option<&CountryCode>) -> BTreeSet<CountryCode> {
        let residency = self.residency.clone().unwrap_or_default();
        if !residency.allowed.is_empty() {
            return residency.allowed;
        }
        residency
            .country
            .as_ref()
            .or(fallback)
            .cloned()
            .into_iter()
            .collect()
    }

    /// Parameters with the residency allowed set filled in, as stored in
    /// proof metadata.
    pub fn effective(
        &self,
        claims: &BTreeSet<ClaimType>,
        subject_country: Option<&CountryCode>,
    ) -> Self {
        let mut out = self.clone();
        if claims.contains(&ClaimType::CountryResident) {
            let mut residency = self.residency.clone().unwrap_or_default();
            residency.allowed = self.effective_allowed(subject_country);
            out.residency = Some(residency);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(list: &[ClaimType]) -> BTreeSet<ClaimType> {
        list.iter().copied().collect()
    }

    fn cc(s: &str) -> CountryCode {
        CountryCode::new(s).unwrap()
    }

    #[test]
    fn string_roundtrip_for_every_claim() {
        for c in ClaimType::ALL {
            assert_eq!(c.as_str().parse::<ClaimType>().unwrap(), c);
            assert_eq!(serde_json::to_string(&c).unwrap(), format!("\"{c}\""));
        }
    }

    #[test]
    fn unknown_claim_is_invalid_claim_type() {
        assert!(matches!(
            "age_over_65".parse::<ClaimType>(),
            Err(DisclosureError::InvalidClaimType(_))
        ));
    }

    #[test]
    fn policy_table() {
        assert_eq!(ClaimType::EmailVerified.min_level(), VerificationLevel::Basic);
        assert_eq!(ClaimType::AgeOver21.min_level(), VerificationLevel::Standard);
        assert_eq!(ClaimType::BiometricVerified.min_level(), VerificationLevel::Standard);
        assert_eq!(ClaimType::CountryResident.proof_kind(), ProofKind::SetMembership);
        assert_eq!(ClaimType::TrustScoreAbove.proof_kind(), ProofKind::Range);
        assert_eq!(ClaimType::SmsVerified.proof_kind(), ProofKind::PedersenKnowledge);
        assert_eq!(ClaimType::AgeOver25.age_lower_bound(), Some(25));
        assert_eq!(ClaimType::TrustScoreAbove.age_lower_bound(), None);
    }

    #[test]
    fn proof_domains_are_distinct() {
        let domains: BTreeSet<String> = ClaimType::ALL.iter().map(|c| c.proof_domain()).collect();
        assert_eq!(domains.len(), ClaimType::ALL.len());
        assert_eq!(ClaimType::AgeOver18.proof_domain(), "veid:sdr:range:age_over_18");
    }

    #[test]
    fn score_claim_requires_threshold() {
        let requested = claims(&[ClaimType::TrustScoreAbove]);
        assert!(matches!(
            ClaimParameters::default().validate_for(&requested),
            Err(DisclosureError::InvalidClaimType(_))
        ));
        ClaimParameters::default()
            .with_score_threshold(70)
            .validate_for(&requested)
            .unwrap();
        assert!(ClaimParameters::default()
            .with_score_threshold(101)
            .validate_for(&requested)
            .is_err());
    }

    #[test]
    fn parameters_for_unrequested_claims_are_rejected() {
        let requested = claims(&[ClaimType::AgeOver18]);
        assert!(matches!(
            ClaimParameters::default().with_score_threshold(50).validate_for(&requested),
            Err(DisclosureError::InvalidProofRequest(_))
        ));
        assert!(ClaimParameters::default()
            .with_allowed_countries([cc("DE")])
            .validate_for(&requested)
            .is_err());
    }

    #[test]
    fn residency_defaults_to_singleton() {
        let requested = claims(&[ClaimType::CountryResident]);
        let p = ClaimParameters::default();
        let eff = p.effective(&requested, Some(&cc("FR")));
        assert_eq!(eff.residency.unwrap().allowed, [cc("FR")].into_iter().collect());

        let p = ClaimParameters {
            residency: Some(ResidencyParams {
                country: Some(cc("NL")),
                allowed: BTreeSet::new(),
            }),
            ..Default::default()
        };
        assert_eq!(p.effective_allowed(Some(&cc("FR"))), [cc("NL")].into_iter().collect());
    }

    #[test]
    fn explicit_allowed_set_wins() {
        let p = ClaimParameters::default().with_allowed_countries([cc("DE"), cc("AT")]);
        assert_eq!(p.effective_allowed(Some(&cc("FR"))).len(), 2);
    }

    #[test]
    fn wire_format_is_typed() {
        let p = ClaimParameters::default().with_score_threshold(70);
        assert_eq!(
            serde_json::to_string(&p).unwrap(),
            r#"{"score_threshold":{"threshold":70}}"#
        );
        assert!(serde_json::from_str::<ClaimParameters>(r#"{"threshold":70}"#).is_err());
        assert!(serde_json::from_str::<ClaimParameters>(
            r#"{"residency":{"allowed":["de"]}}"#
        )
        .is_err());
    }
}
