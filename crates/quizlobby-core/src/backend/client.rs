//! JSON REST client for eligibility checks and claims.
//!
//! One method per endpoint the five providers consume. Transport and
//! non-success statuses both surface as `BackendError`; providers map
//! every error to "not eligible" (fail-closed).

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::BackendError;
use crate::popup::PendingReward;

/// Client for the managed backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base: Url,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgeStatus {
    pub needs_verification: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct RankRewardStatus {
    reward: Option<PendingReward>,
}

#[derive(Debug, Clone, Deserialize)]
struct BonusStatus {
    can_claim: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct WinnersStatus {
    can_show: bool,
}

/// Backend response to any claim POST.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
struct RewardClaimBody<'a> {
    reward_id: &'a str,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let mut base = Url::parse(base_url)?;
        // Joining relative endpoint paths needs a trailing slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base,
        })
    }

    // ── Eligibility checks ───────────────────────────────────────────

    pub async fn age_status(&self, user_id: &str) -> Result<AgeStatus, BackendError> {
        self.get_json(&format!("users/{user_id}/age-status")).await
    }

    pub async fn pending_rank_reward(
        &self,
        user_id: &str,
    ) -> Result<Option<PendingReward>, BackendError> {
        let status: RankRewardStatus = self
            .get_json(&format!("users/{user_id}/rank-reward"))
            .await?;
        Ok(status.reward)
    }

    pub async fn welcome_bonus_available(&self, user_id: &str) -> Result<bool, BackendError> {
        let status: BonusStatus = self
            .get_json(&format!("users/{user_id}/welcome-bonus"))
            .await?;
        Ok(status.can_claim)
    }

    pub async fn daily_gift_available(&self, user_id: &str) -> Result<bool, BackendError> {
        let status: BonusStatus = self
            .get_json(&format!("users/{user_id}/daily-gift"))
            .await?;
        Ok(status.can_claim)
    }

    pub async fn winners_announced_today(&self, user_id: &str) -> Result<bool, BackendError> {
        let status: WinnersStatus = self
            .get_json(&format!("users/{user_id}/winners-today"))
            .await?;
        Ok(status.can_show)
    }

    // ── Claims ───────────────────────────────────────────────────────

    pub async fn claim_rank_reward(
        &self,
        user_id: &str,
        reward_id: &str,
    ) -> Result<ClaimResponse, BackendError> {
        self.post_json(
            &format!("users/{user_id}/rank-reward/claim"),
            &RewardClaimBody { reward_id },
        )
        .await
    }

    pub async fn claim_welcome_bonus(&self, user_id: &str) -> Result<ClaimResponse, BackendError> {
        self.post_json(&format!("users/{user_id}/welcome-bonus/claim"), &())
            .await
    }

    pub async fn claim_daily_gift(&self, user_id: &str) -> Result<ClaimResponse, BackendError> {
        self.post_json(&format!("users/{user_id}/daily-gift/claim"), &())
            .await
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let url = self.base.join(path)?;
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(BackendError::Status {
                endpoint: path.to_string(),
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.json().await?)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let url = self.base.join(path)?;
        let resp = self.http.post(url).json(body).send().await?;
        if !resp.status().is_success() {
            return Err(BackendError::Status {
                endpoint: path.to_string(),
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.json().await?)
    }
}
