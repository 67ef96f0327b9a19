//! Destination phone normalization
//!
//! The vendor expects fully qualified numbers without punctuation. Most of
//! the platform's stores are Brazilian or Venezuelan, so bare national
//! numbers are qualified by shape: 11 digits starting with a known Brazilian
//! DDD get +55, 10 digits get +58. Anything else passes through as-is
//! rather than guessing.

/// Brazilian two-digit area codes (DDD).
const BRAZILIAN_DDDS: [&str; 67] = [
    "11", "12", "13", "14", "15", "16", "17", "18", "19", // São Paulo
    "21", "22", "24", // Rio de Janeiro
    "27", "28", // Espírito Santo
    "31", "32", "33", "34", "35", "37", "38", // Minas Gerais
    "41", "42", "43", "44", "45", "46", // Paraná
    "47", "48", "49", // Santa Catarina
    "51", "53", "54", "55", // Rio Grande do Sul
    "61", // Distrito Federal
    "62", "64", // Goiás
    "63", // Tocantins
    "65", "66", // Mato Grosso
    "67", // Mato Grosso do Sul
    "68", // Acre
    "69", // Rondônia
    "71", "73", "74", "75", "77", // Bahia
    "79", // Sergipe
    "81", "87", // Pernambuco
    "82", // Alagoas
    "83", // Paraíba
    "84", // Rio Grande do Norte
    "85", "88", // Ceará
    "86", "89", // Piauí
    "91", "93", "94", // Pará
    "92", "97", // Amazonas
    "95", // Roraima
    "96", // Amapá
    "98", "99", // Maranhão
];

/// Strip formatting and qualify the number with a country code when its
/// shape identifies one.
pub fn normalize(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.starts_with("55") || digits.starts_with("58") {
        return digits;
    }
    if digits.len() == 11 && BRAZILIAN_DDDS.contains(&&digits[..2]) {
        return format!("55{digits}");
    }
    if digits.len() == 10 {
        return format!("58{digits}");
    }
    digits
}
