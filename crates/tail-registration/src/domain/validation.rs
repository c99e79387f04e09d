//! # Field Validation
//!
//! Structural validation of the registration form. Runs on the whole form on
//! every edit and reports the first failing rule of each field. The logo id is
//! only length-checked here; decoding happens at submit time.

use url::Url;

use super::entities::{
    Category, ChallengeKey, FormField, TailForm, CODE_MAX_LEN, COIN_ID_LEN, HASH_LEN,
    LOGO_ID_LEN, NAME_MAX_LEN,
};
use super::errors::FieldError;

/// Form contents that passed every structural rule.
///
/// Only [`validate`] constructs this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFields {
    hash: String,
    name: String,
    code: String,
    category: Category,
    coin: String,
    logo: String,
    website_url: Option<String>,
    twitter_url: Option<String>,
    discord_url: Option<String>,
    description: String,
}

impl ValidatedFields {
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Eve coin id.
    pub fn coin(&self) -> &str {
        &self.coin
    }

    /// Logo NFT id, not yet decoded.
    pub fn logo(&self) -> &str {
        &self.logo
    }

    pub fn website_url(&self) -> Option<&str> {
        self.website_url.as_deref()
    }

    pub fn twitter_url(&self) -> Option<&str> {
        self.twitter_url.as_deref()
    }

    pub fn discord_url(&self) -> Option<&str> {
        self.discord_url.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn challenge_key(&self) -> ChallengeKey {
        ChallengeKey::new(self.hash.clone(), self.coin.clone())
    }
}

/// Validate every field of `form`.
///
/// Returns all field errors at once, at most one per field, in form order.
pub fn validate(form: &TailForm) -> Result<ValidatedFields, Vec<FieldError>> {
    let mut errors = Vec::new();

    let hash = check(
        &mut errors,
        exact_len(FormField::Hash, &form.hash, HASH_LEN, "Please enter hash"),
    );
    let name = check(
        &mut errors,
        bounded_len(FormField::Name, &form.name, NAME_MAX_LEN, "Please enter name"),
    );
    let code = check(
        &mut errors,
        bounded_len(FormField::Code, &form.code, CODE_MAX_LEN, "Please enter code"),
    );
    let category = check(&mut errors, category(&form.category));
    let coin = check(
        &mut errors,
        exact_len(FormField::Coin, &form.coin, COIN_ID_LEN, "Please enter Coin ID"),
    );
    let logo = check(
        &mut errors,
        exact_len(FormField::Logo, &form.logo, LOGO_ID_LEN, "Please enter NFT ID"),
    );
    let website_url = check(&mut errors, optional_url(FormField::WebsiteUrl, &form.website_url));
    let twitter_url = check(&mut errors, optional_url(FormField::TwitterUrl, &form.twitter_url));
    let discord_url = check(&mut errors, optional_url(FormField::DiscordUrl, &form.discord_url));

    match (hash, name, code, category, coin, logo, website_url, twitter_url, discord_url) {
        (
            Some(hash),
            Some(name),
            Some(code),
            Some(category),
            Some(coin),
            Some(logo),
            Some(website_url),
            Some(twitter_url),
            Some(discord_url),
        ) if errors.is_empty() => Ok(ValidatedFields {
            hash,
            name,
            code,
            category,
            coin,
            logo,
            website_url,
            twitter_url,
            discord_url,
            description: form.description.clone(),
        }),
        _ => Err(errors),
    }
}

/// Errors for `form`, empty if it is valid.
pub fn field_errors(form: &TailForm) -> Vec<FieldError> {
    validate(form).err().unwrap_or_default()
}

fn check<T>(errors: &mut Vec<FieldError>, result: Result<T, FieldError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            errors.push(error);
            None
        }
    }
}

fn exact_len(
    field: FormField,
    value: &str,
    len: usize,
    required: &str,
) -> Result<String, FieldError> {
    if value.is_empty() {
        return Err(FieldError::new(field, required));
    }
    if value.chars().count() != len {
        return Err(FieldError::new(
            field,
            format!("{field} must be exactly {len} characters"),
        ));
    }
    Ok(value.to_string())
}

fn bounded_len(
    field: FormField,
    value: &str,
    max: usize,
    required: &str,
) -> Result<String, FieldError> {
    if value.is_empty() {
        return Err(FieldError::new(field, required));
    }
    if value.chars().count() > max {
        return Err(FieldError::new(
            field,
            format!("{field} must be at most {max} characters"),
        ));
    }
    Ok(value.to_string())
}

fn category(value: &str) -> Result<Category, FieldError> {
    if value.is_empty() {
        return Err(FieldError::new(FormField::Category, "Please select category"));
    }
    value.parse().map_err(|_| {
        let allowed: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
        FieldError::new(
            FormField::Category,
            format!(
                "category must be one of the following values: {}",
                allowed.join(", ")
            ),
        )
    })
}

/// Empty means absent; anything else must be an absolute URL with a host.
fn optional_url(field: FormField, value: &str) -> Result<Option<String>, FieldError> {
    if value.is_empty() {
        return Ok(None);
    }
    match Url::parse(value) {
        Ok(url) if url.has_host() => {
            Ok(Some(value.to_string()))
        }
        _ => Err(FieldError::new(field, format!("{field} must be a valid URL"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NFT_ID: &str = "nft1qqqsyqcyq5rqwzqfpg9scrgwpugpzysnzs23v9ccrydpk8qarc0s9s222c";

    fn valid_form() -> TailForm {
        TailForm::new()
            .with(FormField::Hash, "a".repeat(64))
            .with(FormField::Name, "Spacebucks")
            .with(FormField::Code, "SBX")
            .with(FormField::Category, "meme")
            .with(FormField::Coin, "b".repeat(64))
            .with(FormField::Logo, NFT_ID)
    }

    fn messages(form: &TailForm) -> Vec<(FormField, String)> {
        field_errors(form)
            .into_iter()
            .map(|e| (e.field, e.message))
            .collect()
    }

    #[test]
    fn test_valid_form_passes() {
        let fields = validate(&valid_form()).unwrap();
        assert_eq!(fields.category(), Category::Meme);
        assert_eq!(fields.website_url(), None);
        assert!(fields.challenge_key().is_complete());
        assert_eq!(fields.description(), "");
    }

    #[test]
    fn test_empty_form_reports_required_fields() {
        let errors = messages(&TailForm::new());
        assert_eq!(
            errors,
            vec![
                (FormField::Hash, "Please enter hash".to_string()),
                (FormField::Name, "Please enter name".to_string()),
                (FormField::Code, "Please enter code".to_string()),
                (FormField::Category, "Please select category".to_string()),
                (FormField::Coin, "Please enter Coin ID".to_string()),
                (FormField::Logo, "Please enter NFT ID".to_string()),
            ]
        );
    }

    #[test]
    fn test_length_rules() {
        let form = valid_form()
            .with(FormField::Hash, "a".repeat(63))
            .with(FormField::Name, "n".repeat(101))
            .with(FormField::Code, "TOOLONG")
            .with(FormField::Coin, "b".repeat(65))
            .with(FormField::Logo, &NFT_ID[..61]);

        let errors = messages(&form);
        assert_eq!(errors.len(), 5);
        assert_eq!(errors[0].1, "hash must be exactly 64 characters");
        assert_eq!(errors[1].1, "name must be at most 100 characters");
        assert_eq!(errors[2].1, "code must be at most 5 characters");
        assert_eq!(errors[3].1, "coin must be exactly 64 characters");
        assert_eq!(errors[4].1, "logo must be exactly 62 characters");
    }

    #[test]
    fn test_boundary_lengths_pass() {
        let form = valid_form()
            .with(FormField::Name, "n".repeat(100))
            .with(FormField::Code, "C");
        assert!(validate(&form).is_ok());
    }

    #[test]
    fn test_category_must_be_in_set() {
        let form = valid_form().with(FormField::Category, "option_select0");
        let errors = messages(&form);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, FormField::Category);
        assert!(errors[0].1.starts_with("category must be one of"));
        assert!(errors[0].1.contains("stablecoin"));
    }

    #[test]
    fn test_logo_is_only_length_checked() {
        // Right length, wrong checksum: still structurally valid
        let bad_checksum = format!("{}q", &NFT_ID[..61]);
        let form = valid_form().with(FormField::Logo, bad_checksum);
        assert!(validate(&form).is_ok());
    }

    #[test]
    fn test_optional_urls() {
        let form = valid_form()
            .with(FormField::WebsiteUrl, "https://spacebucks.example")
            .with(FormField::TwitterUrl, "")
            .with(FormField::DiscordUrl, "http://discord.gg/abc");
        let fields = validate(&form).unwrap();
        assert_eq!(fields.website_url(), Some("https://spacebucks.example"));
        assert_eq!(fields.twitter_url(), None);
        assert_eq!(fields.discord_url(), Some("http://discord.gg/abc"));

        // Any scheme is fine as long as the URL has a host
        let form = valid_form().with(FormField::WebsiteUrl, "ftp://example.com/file");
        let fields = validate(&form).unwrap();
        assert_eq!(fields.website_url(), Some("ftp://example.com/file"));

        let form = valid_form()
            .with(FormField::WebsiteUrl, "not a url")
            .with(FormField::TwitterUrl, "data:text/plain,sbx")
            .with(FormField::DiscordUrl, "mailto:someone@example.com");
        let errors = messages(&form);
        assert_eq!(
            errors,
            vec![
                (FormField::WebsiteUrl, "website_url must be a valid URL".to_string()),
                (FormField::TwitterUrl, "twitter_url must be a valid URL".to_string()),
                (FormField::DiscordUrl, "discord_url must be a valid URL".to_string()),
            ]
        );
    }

    #[test]
    fn test_lengths_count_characters_not_bytes() {
        let form = valid_form().with(FormField::Code, "ÄÖÜßé");
        assert!(validate(&form).is_ok());
    }
}
