// ── Tenant identity ──
//
// The tenant is derived from the session's site host, never guessed:
// `contoso.sharepoint.com` → `contoso`. Hosts outside the recognized
// platform suffixes yield no tenant at all, and license validation
// fails closed on that.

use std::fmt;

use url::Url;

/// Hosted-platform domains a tenant host can live under.
const PLATFORM_SUFFIXES: &[&str] = &[
    "sharepoint.com",
    "sharepoint.us",
    "sharepoint.de",
    "sharepoint.cn",
];

/// Qualifier suffixes on the tenant label that don't change the tenant:
/// `contoso-admin` and `contoso-my` are both tenant `contoso`.
const LABEL_QUALIFIERS: &[&str] = &["-admin", "-my"];

/// The organizational identity a session runs under. Scopes license
/// cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantId(String);

impl TenantId {
    /// Derive the tenant from a site URL.
    ///
    /// The host must be `<label>.<platform suffix>`; the tenant is that
    /// label with any `-admin`/`-my` qualifier stripped. Anything else
    /// (bare suffix, unrecognized domain, IP, empty label) is `None`.
    pub fn from_site_url(url: &Url) -> Option<Self> {
        let host = url.host_str()?;
        for suffix in PLATFORM_SUFFIXES {
            let Some(prefix) = host.strip_suffix(suffix) else {
                continue;
            };
            let Some(label) = prefix.strip_suffix('.') else {
                continue;
            };
            // Only the label immediately left of the suffix names the
            // tenant; nested subdomains don't occur on these hosts.
            if label.is_empty() || label.contains('.') {
                return None;
            }
            let tenant = LABEL_QUALIFIERS
                .iter()
                .find_map(|q| label.strip_suffix(q))
                .unwrap_or(label);
            if tenant.is_empty() {
                return None;
            }
            return Some(Self(tenant.to_owned()));
        }
        None
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tenant_of(raw: &str) -> Option<TenantId> {
        TenantId::from_site_url(&Url::parse(raw).unwrap())
    }

    #[test]
    fn extracts_plain_tenant() {
        assert_eq!(
            tenant_of("https://contoso.sharepoint.com/sites/marketing")
                .unwrap()
                .as_str(),
            "contoso"
        );
    }

    #[test]
    fn strips_qualifiers() {
        assert_eq!(
            tenant_of("https://contoso-admin.sharepoint.com/").unwrap().as_str(),
            "contoso"
        );
        assert_eq!(
            tenant_of("https://contoso-my.sharepoint.com/personal/me")
                .unwrap()
                .as_str(),
            "contoso"
        );
    }

    #[test]
    fn sovereign_clouds_recognized() {
        assert_eq!(
            tenant_of("https://bund.sharepoint.de/").unwrap().as_str(),
            "bund"
        );
    }

    #[test]
    fn rejects_unrecognized_hosts() {
        assert!(tenant_of("https://example.com/").is_none());
        assert!(tenant_of("https://sharepoint.com/").is_none());
        assert!(tenant_of("https://a.b.sharepoint.com/").is_none());
        assert!(tenant_of("https://192.168.1.1/").is_none());
        assert!(tenant_of("https://notsharepoint.com/").is_none());
    }
}
