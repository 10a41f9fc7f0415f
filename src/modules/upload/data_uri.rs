use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use regex::Regex;

use crate::modules::upload::model::Rejection;

lazy_static::lazy_static! {
    static ref DATA_URI: Regex = Regex::new(r"^data:image/([A-Za-z0-9_]+);base64,(.+)$")
        .expect("data URI pattern is valid");
    // Padding is optional.
    static ref BASE64: GeneralPurpose = GeneralPurpose::new(
        &alphabet::STANDARD,
        GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
    );
}

/// Decoded `data:image/<ext>;base64,<payload>` string.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUri {
    pub extension: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub fn parse(input: &str) -> Result<DataUri, Rejection> {
    let captures = DATA_URI.captures(input).ok_or(Rejection::InvalidDataUri)?;
    let extension = captures[1].to_string();
    let bytes = BASE64.decode(&captures[2]).map_err(|_| Rejection::InvalidDataUri)?;

    Ok(DataUri { mime_type: mime_for_extension(&extension), extension, bytes })
}

/// `jpg` maps to `image/jpeg`; unknown subtypes keep the declared `image/<ext>` form.
fn mime_for_extension(extension: &str) -> String {
    mime_guess::from_ext(extension)
        .iter()
        .find(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| format!("image/{}", extension.to_ascii_lowercase()))
}
