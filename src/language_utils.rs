use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for target-language code handling
///
/// Translation engines expect an upper-case ISO 639-1 code, optionally with
/// a regional variant (`EN-GB`, `PT-BR`, `ZH-HANS`). This module validates and
/// normalizes such codes and resolves them to display names.

/// Regional variants accepted in addition to plain ISO 639-1 codes
const REGIONAL_VARIANTS: &[&str] = &["EN-GB", "EN-US", "PT-BR", "PT-PT", "ZH-HANS", "ZH-HANT"];

/// Normalize a target language code to engine form (`sv` -> `SV`, `en-gb` -> `EN-GB`)
pub fn normalize_target_code(code: &str) -> Result<String> {
    let normalized = code.trim().replace('_', "-").to_uppercase();
    if normalized.is_empty() {
        return Err(anyhow!("Language code is empty"));
    }

    if normalized.contains('-') {
        if REGIONAL_VARIANTS.contains(&normalized.as_str()) {
            return Ok(normalized);
        }
        return Err(anyhow!("Unsupported regional variant: {}", code));
    }

    if normalized.len() == 2 && Language::from_639_1(&normalized.to_lowercase()).is_some() {
        return Ok(normalized);
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Base ISO 639-1 code of a target code (`EN-GB` -> `en`)
pub fn base_code(code: &str) -> Result<String> {
    let normalized = normalize_target_code(code)?;
    let base = normalized.split('-').next().unwrap_or_default();
    Ok(base.to_lowercase())
}

/// Check if two language codes refer to the same base language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (base_code(code1), base_code(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let base = base_code(code)?;
    let lang = Language::from_639_1(&base)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", base))?;

    Ok(lang.to_name().to_string())
}
