//! Form parsing and validation
//!
//! Post forms arrive as `multipart/form-data` (they may carry an image),
//! comment forms as `application/x-www-form-urlencoded`, and the auth forms
//! as JSON. Cleaning a form yields either typed values or [`FormErrors`].
use std::collections::BTreeMap;
use std::fmt;

use actix_multipart::Multipart;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, Result};
use crate::models::{Group, Post};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const TEXT_TOO_LONG: &str = "Ensure this value has at most 1048576 bytes.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Per-field error messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    fn into_result(self) -> std::result::Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = FormErrors::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({}).", error.code));
                form_errors.add(&field.to_string(), message);
            }
        }
        form_errors
    }
}

/// A file received in the `image` field.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    /// File extension for the sniffed image format, `None` if the bytes are
    /// not a recognizable image.
    pub fn extension(&self) -> Option<&'static str> {
        image::guess_format(&self.bytes)
            .ok()
            .and_then(|format| format.extensions_str().first().copied())
    }
}

/// Raw post form as submitted.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub text: Option<String>,
    pub group: Option<String>,
    pub image: Option<UploadedImage>,
    /// Set when the upload was cut off at the size limit.
    pub image_too_large: bool,
    /// Set when the text part was longer than [`TEXT_FIELD_LIMIT`].
    pub text_too_large: bool,
    /// Set when the group part was longer than [`TEXT_FIELD_LIMIT`].
    pub group_too_large: bool,
}

/// Post form that passed validation.
#[derive(Debug, Clone)]
pub struct CleanPostForm {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<UploadedImage>,
    pub image_extension: Option<&'static str>,
}

impl PostForm {
    /// Validate against the groups that can be chosen.
    pub fn clean(
        self,
        groups: &[Group],
        max_upload_bytes: usize,
    ) -> std::result::Result<CleanPostForm, FormErrors> {
        let mut errors = FormErrors::default();

        let text = self.text.unwrap_or_default();
        if self.text_too_large {
            errors.add("text", TEXT_TOO_LONG);
        } else if text.trim().is_empty() {
            errors.add("text", REQUIRED);
        }

        let group_id = match self.group.as_deref().map(str::trim) {
            _ if self.group_too_large => {
                errors.add("group", INVALID_CHOICE);
                None
            }
            None | Some("") => None,
            Some(raw) => {
                let found = Uuid::parse_str(raw)
                    .ok()
                    .and_then(|id| groups.iter().find(|g| g.id == id));
                match found {
                    Some(group) => Some(group.id),
                    None => {
                        errors.add("group", INVALID_CHOICE);
                        None
                    }
                }
            }
        };

        let mut image_extension = None;
        if self.image_too_large {
            errors.add(
                "image",
                format!("The uploaded image exceeds {} bytes.", max_upload_bytes),
            );
        } else if let Some(image) = &self.image {
            if image.bytes.len() > max_upload_bytes {
                errors.add(
                    "image",
                    format!("The uploaded image exceeds {} bytes.", max_upload_bytes),
                );
            } else {
                match image.extension() {
                    Some(ext) => image_extension = Some(ext),
                    None => errors.add("image", INVALID_IMAGE),
                }
            }
        }

        errors.into_result()?;
        Ok(CleanPostForm {
            text,
            group_id,
            image: self.image,
            image_extension,
        })
    }
}

/// Read a post form from a multipart body.
///
/// Unknown fields are drained and ignored. An empty file part counts as no
/// upload. A part that grows past its limit (`max_upload_bytes` for the
/// image, [`TEXT_FIELD_LIMIT`] for the rest) stops collecting at the first
/// chunk over the limit; the remainder is drained and the form is flagged.
pub async fn read_post_form(mut payload: Multipart, max_upload_bytes: usize) -> Result<PostForm> {
    let mut form = PostForm::default();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::ValidationError(format!("Malformed multipart body: {}", e)))?;

        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().map(str::to_string),
                cd.get_filename().map(str::to_string),
            ),
            None => (None, None),
        };

        let limit = match name.as_deref() {
            Some("image") => max_upload_bytes,
            _ => TEXT_FIELD_LIMIT,
        };

        let mut bytes = Vec::new();
        let mut truncated = false;
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| AppError::ValidationError(format!("Error reading upload field: {}", e)))?;
            if truncated {
                continue;
            }
            if bytes.len() + chunk.len() > limit {
                truncated = true;
                bytes.clear();
                continue;
            }
            bytes.extend_from_slice(&chunk);
        }

        match name.as_deref() {
            Some("text") => {
                form.text_too_large = truncated;
                form.text = Some(String::from_utf8_lossy(&bytes).into_owned());
            }
            Some("group") => {
                form.group_too_large = truncated;
                form.group = Some(String::from_utf8_lossy(&bytes).into_owned());
            }
            Some("image") => {
                if truncated {
                    form.image_too_large = true;
                } else if !bytes.is_empty() {
                    form.image = Some(UploadedImage { filename, bytes });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Byte limit for the non-file parts of a post form.
pub const TEXT_FIELD_LIMIT: usize = 1024 * 1024;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn clean(self) -> std::result::Result<String, FormErrors> {
        let mut errors = FormErrors::default();
        if self.text.trim().is_empty() {
            errors.add("text", REQUIRED);
        }
        errors.into_result()?;
        Ok(self.text)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupForm {
    #[validate(length(min = 1, max = 150, message = "Ensure this value has at most 150 characters."))]
    pub username: String,
    #[validate(length(min = 8, message = "This password is too short. It must contain at least 8 characters."))]
    pub password: String,
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
}

impl SignupForm {
    pub fn clean(mut self) -> std::result::Result<SignupForm, FormErrors> {
        self.username = self.username.trim().to_string();
        if self.email.as_deref().map(str::trim) == Some("") {
            self.email = None;
        }

        let mut errors = match self.validate() {
            Ok(()) => FormErrors::default(),
            Err(e) => FormErrors::from(e),
        };

        if !self.username.is_empty() && !is_valid_username(&self.username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
        if !self.password.is_empty() && self.password.chars().all(|c| c.is_ascii_digit()) {
            errors.add("password", "This password is entirely numeric.");
        }

        errors.into_result()?;
        Ok(self)
    }
}

fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub username: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    pub fn clean(self) -> std::result::Result<LoginForm, FormErrors> {
        self.validate()?;
        Ok(self)
    }
}

/// Description of a form as rendered for a client.
#[derive(Debug, Clone, Serialize)]
pub struct FormSchema {
    pub fields: Vec<FieldSchema>,
}

impl FormSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSchema {
    pub name: &'static str,
    pub field_type: &'static str,
    pub label: &'static str,
    pub help_text: &'static str,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

pub const CHAR_FIELD: &str = "CharField";
pub const CHOICE_FIELD: &str = "ChoiceField";
pub const IMAGE_FIELD: &str = "ImageField";

/// Post form fields; `initial` fills them from an existing post when editing.
pub fn post_form_schema(groups: &[Group], initial: Option<&Post>) -> FormSchema {
    let choices = groups
        .iter()
        .map(|g| Choice {
            value: g.id.to_string(),
            label: g.title.clone(),
        })
        .collect();

    FormSchema {
        fields: vec![
            FieldSchema {
                name: "text",
                field_type: CHAR_FIELD,
                label: "Post text",
                help_text: "Enter the post text",
                required: true,
                choices: None,
                initial: initial.map(|p| serde_json::Value::String(p.text.clone())),
            },
            FieldSchema {
                name: "group",
                field_type: CHOICE_FIELD,
                label: "Group",
                help_text: "Choose a group",
                required: false,
                choices: Some(choices),
                initial: initial
                    .and_then(|p| p.group_id)
                    .map(|id| serde_json::Value::String(id.to_string())),
            },
            FieldSchema {
                name: "image",
                field_type: IMAGE_FIELD,
                label: "Image",
                help_text: "",
                required: false,
                choices: None,
                initial: initial
                    .and_then(|p| p.image.clone())
                    .map(serde_json::Value::String),
            },
        ],
    }
}

pub fn comment_form_schema() -> FormSchema {
    FormSchema {
        fields: vec![FieldSchema {
            name: "text",
            field_type: CHAR_FIELD,
            label: "Comment",
            help_text: "Enter the comment text",
            required: true,
            choices: None,
            initial: None,
        }],
    }
}

pub fn login_form_schema(next: Option<&str>) -> FormSchema {
    FormSchema {
        fields: vec![
            FieldSchema {
                name: "username",
                field_type: CHAR_FIELD,
                label: "Username",
                help_text: "",
                required: true,
                choices: None,
                initial: None,
            },
            FieldSchema {
                name: "password",
                field_type: CHAR_FIELD,
                label: "Password",
                help_text: "",
                required: true,
                choices: None,
                initial: None,
            },
            FieldSchema {
                name: "next",
                field_type: CHAR_FIELD,
                label: "",
                help_text: "",
                required: false,
                choices: None,
                initial: next.map(|n| serde_json::Value::String(n.to_string())),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent GIF
    const SMALL_GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x21, 0xf9,
        0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00,
        0x00, 0x02, 0x00, 0x3b,
    ];

    fn group(title: &str, slug: &str) -> Group {
        Group {
            id: Uuid::new_v4(),
            title: title.to_string(),
            slug: slug.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_post_form_requires_text() {
        let form = PostForm {
            text: Some("   ".to_string()),
            ..Default::default()
        };
        let errors = form.clean(&[], 1024).unwrap_err();
        assert_eq!(errors.get("text").unwrap(), [REQUIRED.to_string()]);
    }

    #[test]
    fn test_post_form_group_must_exist() {
        let groups = vec![group("Test group", "test_slug")];
        let form = PostForm {
            text: Some("hello".to_string()),
            group: Some(Uuid::new_v4().to_string()),
            ..Default::default()
        };
        let errors = form.clean(&groups, 1024).unwrap_err();
        assert!(errors.has("group"));
        assert!(!errors.has("text"));
    }

    #[test]
    fn test_post_form_blank_group_means_none() {
        let form = PostForm {
            text: Some("hello".to_string()),
            group: Some(String::new()),
            ..Default::default()
        };
        let clean = form.clean(&[], 1024).unwrap();
        assert_eq!(clean.group_id, None);
    }

    #[test]
    fn test_post_form_accepts_gif() {
        let groups = vec![group("Test group", "test_slug")];
        let form = PostForm {
            text: Some("hello".to_string()),
            group: Some(groups[0].id.to_string()),
            image: Some(UploadedImage {
                filename: Some("small.gif".to_string()),
                bytes: SMALL_GIF.to_vec(),
            }),
            ..Default::default()
        };
        let clean = form.clean(&groups, 1024).unwrap();
        assert_eq!(clean.group_id, Some(groups[0].id));
        assert_eq!(clean.image_extension, Some("gif"));
    }

    #[test]
    fn test_post_form_reports_oversized_text() {
        let form = PostForm {
            text: Some(String::new()),
            text_too_large: true,
            group: Some("x".repeat(10)),
            group_too_large: true,
            ..Default::default()
        };
        let errors = form.clean(&[], 1024).unwrap_err();
        assert_eq!(errors.get("text").unwrap(), [TEXT_TOO_LONG.to_string()]);
        assert_eq!(errors.get("group").unwrap(), [INVALID_CHOICE.to_string()]);
    }

    #[test]
    fn test_post_form_rejects_non_image() {
        let form = PostForm {
            text: Some("hello".to_string()),
            image: Some(UploadedImage {
                filename: Some("notes.gif".to_string()),
                bytes: b"definitely not an image".to_vec(),
            }),
            ..Default::default()
        };
        let errors = form.clean(&[], 1024).unwrap_err();
        assert_eq!(errors.get("image").unwrap(), [INVALID_IMAGE.to_string()]);
    }

    #[test]
    fn test_post_form_rejects_oversized_image() {
        let form = PostForm {
            text: Some("hello".to_string()),
            image: Some(UploadedImage {
                filename: None,
                bytes: SMALL_GIF.to_vec(),
            }),
            ..Default::default()
        };
        let errors = form.clean(&[], 10).unwrap_err();
        assert!(errors.has("image"));
    }

    #[test]
    fn test_comment_form_ignores_blank() {
        let errors = CommentForm {
            text: "\n ".to_string(),
        }
        .clean()
        .unwrap_err();
        assert!(errors.has("text"));
    }

    #[test]
    fn test_signup_form_rules() {
        let form = SignupForm {
            username: "bad name!".to_string(),
            password: "12345678".to_string(),
            email: Some(String::new()),
            first_name: None,
            last_name: None,
        };
        let errors = form.clean().unwrap_err();
        assert!(errors.has("username"));
        assert_eq!(
            errors.get("password").unwrap(),
            ["This password is entirely numeric.".to_string()]
        );
        assert!(!errors.has("email"));
    }

    #[test]
    fn test_signup_form_short_password() {
        let form = SignupForm {
            username: "leo".to_string(),
            password: "short".to_string(),
            email: None,
            first_name: None,
            last_name: None,
        };
        let errors = form.clean().unwrap_err();
        assert!(errors.has("password"));
    }

    #[test]
    fn test_post_form_schema_labels() {
        let groups = vec![group("Test group", "test_slug")];
        let schema = post_form_schema(&groups, None);

        let text = schema.field("text").unwrap();
        assert_eq!(text.field_type, CHAR_FIELD);
        assert_eq!(text.label, "Post text");
        assert_eq!(text.help_text, "Enter the post text");

        let group_field = schema.field("group").unwrap();
        assert_eq!(group_field.field_type, CHOICE_FIELD);
        assert_eq!(group_field.label, "Group");
        assert_eq!(group_field.help_text, "Choose a group");
        assert_eq!(group_field.choices.as_ref().unwrap().len(), 1);

        assert_eq!(schema.field("image").unwrap().field_type, IMAGE_FIELD);
    }

    #[test]
    fn test_form_errors_display() {
        let mut errors = FormErrors::default();
        errors.add("text", REQUIRED);
        errors.add("group", "bad");
        assert_eq!(errors.to_string(), "group: bad; text: This field is required.");
    }
}
