//! Keyword-based expense categorization
//!
//! Each category owns a set of lower-case keywords (Turkish and English). A
//! description belongs to the first category, in table order, that has a
//! keyword appearing anywhere in the lower-cased description. When two
//! categories share a keyword (e.g. "telefon" is both a bill and a gadget),
//! the earlier row wins. No match means [`ExpenseCategory::Other`].

use crate::models::ExpenseCategory;

/// Category keyword table, in tie-break order
pub static KEYWORD_TABLE: &[(ExpenseCategory, &[&str])] = &[
    (
        ExpenseCategory::Food,
        &[
            "market", "yemek", "ekmek", "gıda", "restaurant", "restoran", "kafe", "kahve",
            "coffee", "starbucks", "migros", "carrefour", "a101", "bim", "pizza", "dominos",
            "grocery", "groceries", "lunch", "dinner", "breakfast",
        ],
    ),
    (
        ExpenseCategory::Transport,
        &[
            "benzin", "yakıt", "otobüs", "metro", "taksi", "taxi", "uber", "araç", "uçak",
            "bilet", "pegasus", "thy", "transfer", "fuel", "bus", "train", "flight",
        ],
    ),
    (
        ExpenseCategory::Utilities,
        &[
            "elektrik", "su faturası", "doğalgaz", "internet", "telefon", "fatura",
            "electricity", "water bill", "gas bill",
        ],
    ),
    (
        ExpenseCategory::Entertainment,
        &[
            "sinema", "film", "konser", "tiyatro", "oyun", "netflix", "spotify", "abonel",
            "disney", "cinema", "concert", "movie",
        ],
    ),
    (
        ExpenseCategory::Health,
        &[
            "doktor", "hastane", "eczane", "ilaç", "sağlık", "doctor", "hospital", "pharmacy",
            "medicine",
        ],
    ),
    (
        ExpenseCategory::Education,
        &[
            "kitap", "kurs", "eğitim", "okul", "ders", "udemy", "coursera", "book", "course",
            "school", "tuition",
        ],
    ),
    (
        ExpenseCategory::Shopping,
        &[
            "giyim", "kıyafet", "ayakkabı", "alışveriş", "laptop", "bilgisayar", "telefon",
            "mouse", "klavye", "monitör", "kamera", "kulaklık", "macbook", "iphone",
            "samsung", "apple", "logitech", "asus", "lenovo", "dell", "razer", "keychron",
            "anker", "teknosa", "vatan", "mediamarkt", "hepsiburada", "trendyol", "amazon",
            "n11", "usb", "ssd", "ekran", "tablet", "ipad", "airpods", "çanta", "kılıf",
            "aksesuar", "adapter", "kablo", "şarj", "powerbank", "webcam", "mikrofon",
            "shoes", "clothing", "headphones",
        ],
    ),
    (
        ExpenseCategory::Housing,
        &[
            "kira", "rent", "mobilya", "otel", "konaklama", "hilton", "kiralama", "hotel",
            "furniture",
        ],
    ),
    (
        ExpenseCategory::Personal,
        &["kuaför", "berber", "güzellik", "spa", "masaj", "barber", "haircut", "massage"],
    ),
];

/// Assign a category to a description by keyword membership
pub fn categorize(description: &str) -> ExpenseCategory {
    let lower = description.to_lowercase();

    KEYWORD_TABLE
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(category, _)| *category)
        .unwrap_or(ExpenseCategory::Other)
}

/// Every category whose keywords match, in table order (for diagnostics)
pub fn matching_categories(description: &str) -> Vec<ExpenseCategory> {
    let lower = description.to_lowercase();

    KEYWORD_TABLE
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(category, _)| *category)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_categories() {
        assert_eq!(categorize("kahve"), ExpenseCategory::Food);
        assert_eq!(categorize("Starbucks Latte"), ExpenseCategory::Food);
        assert_eq!(categorize("taksi"), ExpenseCategory::Transport);
        assert_eq!(categorize("Netflix abonelik"), ExpenseCategory::Entertainment);
        assert_eq!(categorize("eczane"), ExpenseCategory::Health);
        assert_eq!(categorize("Udemy kursu"), ExpenseCategory::Education);
        assert_eq!(categorize("laptop"), ExpenseCategory::Shopping);
        assert_eq!(categorize("ev kirası"), ExpenseCategory::Housing);
        assert_eq!(categorize("berber"), ExpenseCategory::Personal);
    }

    #[test]
    fn test_no_match_is_other() {
        assert_eq!(categorize("misc thing"), ExpenseCategory::Other);
        assert_eq!(categorize(""), ExpenseCategory::Other);
    }

    #[test]
    fn test_case_insensitive_unicode() {
        assert_eq!(categorize("MARKET ALIŞVERİŞİ"), ExpenseCategory::Food);
        assert_eq!(categorize("Doğalgaz"), ExpenseCategory::Utilities);
    }

    #[test]
    fn test_tie_break_uses_table_order() {
        // "market alışverişi" hits FOOD ("market") and SHOPPING ("alışveriş")
        assert_eq!(
            matching_categories("market alışverişi"),
            vec![ExpenseCategory::Food, ExpenseCategory::Shopping]
        );
        assert_eq!(categorize("market alışverişi"), ExpenseCategory::Food);

        // "telefon" is declared under UTILITIES before SHOPPING
        assert_eq!(
            matching_categories("telefon"),
            vec![ExpenseCategory::Utilities, ExpenseCategory::Shopping]
        );
        assert_eq!(categorize("telefon"), ExpenseCategory::Utilities);
    }

    #[test]
    fn test_table_rows_follow_category_order() {
        let order: Vec<_> = KEYWORD_TABLE.iter().map(|(c, _)| *c).collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
        assert!(!order.contains(&ExpenseCategory::Other));
    }
}
