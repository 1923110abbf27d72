use serde::{Deserialize, Serialize};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_COMPANY_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MIN_MESSAGE_LEN: usize = 10;
pub const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    pub message: String,
    #[serde(default, alias = "turnstile_token")]
    pub turnstile_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub submission_id: String,
}

impl ContactRequest {
    /// 校验表单字段，返回第一个不合法字段的提示
    pub fn validate(&self) -> Result<(), String> {
        let name_len = self.name.trim().chars().count();
        if name_len == 0 || name_len > MAX_NAME_LEN {
            return Err(format!("Name must be 1 to {} characters", MAX_NAME_LEN));
        }

        if !is_valid_email(self.email.trim()) {
            return Err("Email address is invalid".to_string());
        }

        if let Some(company) = &self.company {
            if company.trim().chars().count() > MAX_COMPANY_LEN {
                return Err(format!(
                    "Company must be at most {} characters",
                    MAX_COMPANY_LEN
                ));
            }
        }

        let message_len = self.message.trim().chars().count();
        if !(MIN_MESSAGE_LEN..=MAX_MESSAGE_LEN).contains(&message_len) {
            return Err(format!(
                "Message must be {} to {} characters",
                MIN_MESSAGE_LEN, MAX_MESSAGE_LEN
            ));
        }

        Ok(())
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ContactRequest {
        ContactRequest {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            company: Some("Analytical Engines".into()),
            message: "I would like a demo of the portfolio tools.".into(),
            turnstile_token: None,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_invalid_fields() {
        let mut req = request();
        req.name = "   ".into();
        assert!(req.validate().unwrap_err().starts_with("Name"));

        let mut req = request();
        req.message = "too short".into();
        assert!(req.validate().unwrap_err().starts_with("Message"));

        let mut req = request();
        req.company = Some("x".repeat(MAX_COMPANY_LEN + 1));
        assert!(req.validate().unwrap_err().starts_with("Company"));
    }

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("ab.co"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@b@c.co"));
        assert!(!is_valid_email("a@localhost"));
        assert!(!is_valid_email("a@.co"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email(&format!("{}@b.co", "a".repeat(MAX_EMAIL_LEN))));
    }

    #[test]
    fn test_deserializes_camel_case_token() {
        let req: ContactRequest = serde_json::from_str(
            r#"{"name":"Ada","email":"ada@example.com","message":"Hello there, RoboInvestor","turnstileToken":"tok"}"#,
        )
        .unwrap();
        assert_eq!(req.turnstile_token.as_deref(), Some("tok"));
        assert!(req.company.is_none());
    }
}
