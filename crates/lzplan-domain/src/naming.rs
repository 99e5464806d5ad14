use crate::error::DomainError;
use crate::types::{Configuration, OrgContext, ResourceCategory};

/// Suffix appended when the caller does not pick one.
pub const DEFAULT_SUFFIX: &str = "01";

const SEPARATORS: [char; 3] = ['-', '_', '.'];

/// Storage account names: 3-24 lowercase letters and digits.
const STORAGE_ACCOUNT_MIN_LEN: usize = 3;
const STORAGE_ACCOUNT_MAX_LEN: usize = 24;

/// Render `template` against `ctx`, then append `suffix`.
///
/// Recognized placeholders are `{region}` (the region short code), `{org}`,
/// `{pattern}` and `{name}` (`logical_name`). The template is scanned once,
/// left to right, so substituted text is never expanded again. Anything else
/// in braces, including an unterminated `{`, is copied through untouched.
///
/// A suffix that does not start with `-`, `_` or `.` gets a `-` prefixed.
/// An empty suffix appends nothing.
pub fn render(ctx: &OrgContext, template: &str, logical_name: &str, suffix: &str) -> String {
    let mut out = String::with_capacity(template.len() + logical_name.len() + 16);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            rest = "";
            break;
        };

        let key = &after[..close];
        if key.contains('{') {
            // `{{name}` and friends: keep the first brace, rescan from the next.
            out.push('{');
            rest = after;
            continue;
        }

        match placeholder(ctx, key, logical_name) {
            Some(value) => out.push_str(value),
            None => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);

    if !suffix.is_empty() {
        if !suffix.starts_with(&SEPARATORS[..]) {
            out.push('-');
        }
        out.push_str(suffix);
    }
    out
}

/// [`render`] with [`DEFAULT_SUFFIX`].
pub fn render_default(ctx: &OrgContext, template: &str, logical_name: &str) -> String {
    render(ctx, template, logical_name, DEFAULT_SUFFIX)
}

fn placeholder<'a>(ctx: &'a OrgContext, key: &str, logical_name: &'a str) -> Option<&'a str> {
    match key {
        "region" => Some(ctx.region_code()),
        "org" => Some(ctx.org()),
        "pattern" => Some(ctx.pattern()),
        "name" => Some(logical_name),
        _ => None,
    }
}

/// Fold a rendered name into the provider's storage account alphabet.
pub fn storage_account_name(rendered: &str) -> String {
    rendered
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .take(STORAGE_ACCOUNT_MAX_LEN)
        .collect()
}

/// Reject a normalised storage account name shorter than the provider allows.
pub fn check_storage_account_name(name: &str) -> Result<(), DomainError> {
    if name.len() < STORAGE_ACCOUNT_MIN_LEN {
        return Err(DomainError::InvalidName {
            category: ResourceCategory::StorageAccount,
            name: name.to_string(),
            reason: format!(
                "needs at least {STORAGE_ACCOUNT_MIN_LEN} letters or digits after normalisation"
            ),
        });
    }
    Ok(())
}

impl Configuration {
    /// Render the name of a `category` resource with the default suffix.
    pub fn render_name(&self, category: ResourceCategory, logical_name: &str) -> String {
        let rendered = render_default(&self.context, self.naming.template(category), logical_name);
        match category {
            ResourceCategory::StorageAccount => storage_account_name(&rendered),
            _ => rendered,
        }
    }

    /// Check the rendered names the provider would refuse outright.
    ///
    /// Only the flow-log storage account has a length floor, and only when
    /// the network watcher is on.
    pub fn validate_names(&self) -> Result<(), DomainError> {
        if self.monitoring.enable_network_watcher {
            let storage = self.render_name(
                ResourceCategory::StorageAccount,
                &self.monitoring.storage_account_name,
            );
            check_storage_account_name(&storage)?;
        }
        Ok(())
    }
}
