//! Session establishment payloads and organization resolution.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Login payload returned by `POST /rest/session`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionInfo {
    /// Numeric id of the authenticated user.
    pub user_id: u64,
    /// Email the account is registered under.
    #[serde(default)]
    pub user_email: Option<String>,
    /// Anti-CSRF token to echo back on every authenticated request.
    pub csrf_token: String,
    /// Organizations the account belongs to.
    #[serde(default)]
    pub orgs: Vec<OrgMembership>,
}

/// One organization membership of the authenticated account.
#[derive(Debug, Clone, Deserialize)]
pub struct OrgMembership {
    /// Numeric organization id, the path segment of every org-scoped URL.
    pub id: u64,
    /// Human-readable organization name.
    pub name: String,
    /// Whether the organization is currently accessible to the account.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl SessionInfo {
    /// Pick the organization this session binds to.
    ///
    /// A requested name must match one of the memberships exactly. Without a
    /// requested name the choice is only unambiguous when the account belongs
    /// to a single organization.
    pub(crate) fn resolve_org(&self, requested: Option<&str>) -> Result<&OrgMembership> {
        if self.orgs.is_empty() {
            return Err(Error::NoOrganizationMembership);
        }
        let available = || self.orgs.iter().map(|org| org.name.clone()).collect();
        let chosen = match requested {
            Some(name) => match self.orgs.iter().find(|org| org.name == name) {
                Some(org) => org,
                None => {
                    return Err(Error::OrganizationNotFound {
                        requested: name.to_string(),
                        available: available(),
                    });
                }
            },
            None if self.orgs.len() == 1 => &self.orgs[0],
            None => {
                return Err(Error::OrganizationNotSpecified {
                    available: available(),
                });
            }
        };
        if !chosen.enabled {
            return Err(Error::OrganizationDisabled {
                name: chosen.name.clone(),
            });
        }
        Ok(chosen)
    }
}

/// Live session state. Re-authentication replaces the whole value and bumps
/// `epoch`, which lets concurrent callers tell a fresh session from the one
/// they saw rejected.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub csrf_token: String,
    pub cookie: String,
    pub org_id: u64,
    pub org_name: String,
    pub user_id: u64,
    pub user_email: Option<String>,
    pub epoch: u64,
}
