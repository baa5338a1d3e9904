//! Demo adapter backed by a static sample set
//!
//! Used when demo mode is on: lets the whole service run without vendor
//! credentials. Matching is deliberately loose (exact key, contained key,
//! contained model, then best word overlap) so casual queries such as
//! "dell monitor" still land on a sample.

use crate::types::{AdapterError, SourceAdapter};
use async_trait::async_trait;
use psf_common::{Query, SourceResult};
use tracing::debug;

/// Words that say nothing about which sample is meant
const GENERIC_WORDS: &[&str] = &["monitor", "laptop", "phone", "pro", "the", "and", "with"];

struct SampleProduct {
    key: &'static str,
    gtin: Option<&'static str>,
    brand: &'static str,
    model: &'static str,
    category: &'static str,
    price_range: Option<&'static str>,
    availability: Option<&'static str>,
    specifications: &'static [(&'static str, &'static str)],
    citations: &'static [&'static str],
}

const SAMPLES: &[SampleProduct] = &[
    SampleProduct {
        key: "iphone 15 pro",
        gtin: None,
        brand: "Apple",
        model: "iPhone 15 Pro",
        category: "Smartphone",
        price_range: Some("$999 - $1,499"),
        availability: Some("Available"),
        specifications: &[
            ("display", "6.1-inch Super Retina XDR OLED, 2556×1179 resolution"),
            ("processor", "A17 Pro chip with 6-core CPU"),
            ("storage", "128GB, 256GB, 512GB, 1TB options"),
            ("camera", "48MP Main, 12MP Ultra Wide, 12MP Telephoto (3x zoom)"),
            ("battery", "Up to 23 hours video playback"),
            ("os", "iOS 17"),
            ("connectivity", "5G, Wi-Fi 6E, Bluetooth 5.3"),
            ("materials", "Titanium design with Ceramic Shield front"),
            ("water_resistance", "IP68 (up to 6 meters for 30 minutes)"),
        ],
        citations: &["apple.com", "gsmarena.com", "techradar.com", "theverge.com"],
    },
    SampleProduct {
        key: "sony wh-1000xm5",
        gtin: None,
        brand: "Sony",
        model: "WH-1000XM5",
        category: "Wireless Noise-Canceling Headphones",
        price_range: Some("$399 - $429"),
        availability: Some("Available"),
        specifications: &[
            ("driver", "30mm dynamic drivers"),
            ("frequency_response", "4Hz - 40kHz"),
            ("battery_life", "30 hours with ANC, 40 hours without ANC"),
            ("charging", "USB-C, Quick charge: 3 min = 3 hours playback"),
            ("weight", "250g"),
            ("connectivity", "Bluetooth 5.2, NFC, 3.5mm jack"),
            ("noise_canceling", "Industry-leading ANC with V1 processor"),
            ("microphones", "8 microphones for call clarity"),
            ("codec_support", "LDAC, SBC, AAC"),
        ],
        citations: &["sony.com", "rtings.com", "whatifi.com", "headphonesty.com"],
    },
    SampleProduct {
        key: "macbook pro m3",
        gtin: None,
        brand: "Apple",
        model: "MacBook Pro M3",
        category: "Laptop",
        price_range: Some("$1,599 - $2,499"),
        availability: Some("Available"),
        specifications: &[
            ("processor", "Apple M3 chip with 8-core CPU and 10-core GPU"),
            ("memory", "8GB, 16GB, or 24GB unified memory"),
            ("storage", "512GB, 1TB, 2TB SSD options"),
            ("display", "14-inch or 16-inch Liquid Retina XDR display"),
            ("battery", "Up to 22 hours video playback"),
            ("ports", "3x Thunderbolt 4, HDMI, SDXC, MagSafe 3"),
            ("os", "macOS Sonoma"),
            ("weight", "3.4 lbs (14-inch), 4.7 lbs (16-inch)"),
        ],
        citations: &["apple.com", "macrumors.com", "9to5mac.com"],
    },
    SampleProduct {
        key: "dell p2422h",
        gtin: None,
        brand: "Dell",
        model: "P2422H",
        category: "Professional Monitor",
        price_range: Some("$200 - $280"),
        availability: Some("Available"),
        specifications: &[
            ("screen_size", "24-inch (23.8-inch viewable)"),
            ("resolution", "1920 x 1080 Full HD"),
            ("panel_type", "IPS technology"),
            ("refresh_rate", "60Hz"),
            ("response_time", "8ms (normal); 5ms (fast)"),
            ("brightness", "250 cd/m² (typical)"),
            ("contrast_ratio", "1000:1 (typical)"),
            ("color_gamut", "99% sRGB"),
            ("connectivity", "HDMI 1.4, DisplayPort 1.2, VGA, USB 3.2 hub"),
            ("adjustability", "Height, tilt, swivel, pivot"),
            ("vesa_mount", "100mm x 100mm"),
            ("power_consumption", "18W (typical)"),
        ],
        citations: &["dell.com", "displayspecifications.com", "rtings.com"],
    },
    SampleProduct {
        key: "samsung galaxy s24",
        gtin: None,
        brand: "Samsung",
        model: "Galaxy S24",
        category: "Smartphone",
        price_range: Some("$799 - $999"),
        availability: Some("Available"),
        specifications: &[
            ("display", "6.2-inch Dynamic AMOLED 2X, 2340×1080"),
            ("processor", "Snapdragon 8 Gen 3 / Exynos 2400"),
            ("storage", "128GB, 256GB, 512GB"),
            ("camera", "50MP main, 12MP ultrawide, 10MP telephoto"),
            ("battery", "4000mAh with 25W fast charging"),
            ("os", "Android 14 with One UI 6.1"),
            ("connectivity", "5G, Wi-Fi 6E, Bluetooth 5.3"),
            ("materials", "Aluminum frame with Gorilla Glass Victus 2"),
            ("water_resistance", "IP68"),
        ],
        citations: &["samsung.com", "gsmarena.com", "androidcentral.com"],
    },
    SampleProduct {
        key: "tesla model 3",
        gtin: None,
        brand: "Tesla",
        model: "Model 3",
        category: "Electric Vehicle",
        price_range: Some("$38,990 - $54,990"),
        availability: Some("Available"),
        specifications: &[
            ("drivetrain", "Rear-wheel drive / All-wheel drive"),
            ("range", "272-358 miles EPA estimated"),
            ("acceleration", "0-60 mph in 4.2-5.8 seconds"),
            ("top_speed", "125-162 mph"),
            ("charging", "Supercharger V3 compatible, up to 250kW"),
            ("interior", "15-inch touchscreen, premium audio"),
            ("autopilot", "Standard Autopilot included"),
            ("seating", "5 adults"),
            ("cargo", "15 cu ft rear, 2.8 cu ft front trunk"),
        ],
        citations: &["tesla.com", "edmunds.com", "motortrend.com"],
    },
    SampleProduct {
        key: "airpods pro",
        gtin: None,
        brand: "Apple",
        model: "AirPods Pro (2nd generation)",
        category: "Wireless Earbuds",
        price_range: Some("$249 - $279"),
        availability: Some("Available"),
        specifications: &[
            ("chip", "Apple H2 chip"),
            ("noise_cancellation", "Active Noise Cancellation"),
            ("battery_life", "6 hours listening, 30 hours with case"),
            ("charging", "MagSafe, Lightning, Qi wireless"),
            ("audio", "Adaptive Audio, Personalized Spatial Audio"),
            ("controls", "Touch control, Siri voice control"),
            ("water_resistance", "IPX4 (earbuds and case)"),
            ("case", "MagSafe Charging Case included"),
        ],
        citations: &["apple.com", "soundguys.com", "whatifi.com"],
    },
    SampleProduct {
        key: "sample brand demo product",
        gtin: Some("012345678905"),
        brand: "Sample Brand",
        model: "Demo Product",
        category: "Consumer Goods",
        price_range: None,
        availability: None,
        specifications: &[
            ("gs1_verified", "Yes"),
            ("identification_standard", "GS1 GTIN"),
        ],
        citations: &["gs1.org"],
    },
    SampleProduct {
        key: "tech corp electronic device",
        gtin: Some("1234567890123"),
        brand: "Tech Corp",
        model: "Electronic Device",
        category: "Electronics",
        price_range: None,
        availability: None,
        specifications: &[
            ("gs1_verified", "Yes"),
            ("identification_standard", "GS1 GTIN"),
        ],
        citations: &["gs1.org"],
    },
];

/// Demo adapter
#[derive(Debug, Default)]
pub struct DemoAdapter;

impl DemoAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Sample keys, for "try one of these" hints
    pub fn sample_keys() -> Vec<&'static str> {
        SAMPLES.iter().filter(|s| s.gtin.is_none()).map(|s| s.key).collect()
    }
}

#[async_trait]
impl SourceAdapter for DemoAdapter {
    fn id(&self) -> &'static str {
        "demo"
    }

    async fn search(&self, query: &Query) -> Result<SourceResult, AdapterError> {
        let sample = find_sample(query).ok_or_else(|| {
            AdapterError::NotFound(format!(
                "'{}' is not in the demo sample set (try: {})",
                query.text,
                Self::sample_keys().join(", ")
            ))
        })?;

        debug!(query = %query.text, sample = sample.key, "Demo sample matched");

        let mut result = SourceResult::new(self.id());
        result.brand = Some(sample.brand.to_string());
        result.model = Some(sample.model.to_string());
        result.category = Some(sample.category.to_string());
        result.price_range = sample.price_range.map(str::to_string);
        result.availability = sample.availability.map(str::to_string);
        for (key, value) in sample.specifications {
            result.insert_spec(key, value);
        }
        if let Some(gtin) = sample.gtin {
            result.insert_spec("gtin", gtin);
        }
        result.citations = sample.citations.iter().map(|c| c.to_string()).collect();

        Ok(result.sanitized())
    }
}

fn find_sample(query: &Query) -> Option<&'static SampleProduct> {
    if let Some(gtin) = query.gtin() {
        return SAMPLES.iter().find(|s| s.gtin == Some(gtin.as_str()));
    }

    let text = query.text.to_lowercase();

    if let Some(sample) = SAMPLES.iter().find(|s| text.contains(s.key)) {
        return Some(sample);
    }
    if let Some(sample) = SAMPLES.iter().find(|s| text.contains(&s.model.to_lowercase())) {
        return Some(sample);
    }

    let words: Vec<&str> = text
        .split_whitespace()
        .filter(|w| w.len() > 2 && !GENERIC_WORDS.contains(w))
        .collect();

    // Highest overlap wins; earlier sample on ties
    let mut best: Option<(&SampleProduct, usize)> = None;
    for sample in SAMPLES {
        let sample_words: Vec<String> = format!("{} {}", sample.key, sample.brand.to_lowercase())
            .split_whitespace()
            .filter(|w| w.len() > 2)
            .map(str::to_string)
            .collect();
        let score = words
            .iter()
            .filter(|w| sample_words.iter().any(|s| s.contains(*w) || w.contains(s.as_str())))
            .count();
        if score > 0 && best.map_or(true, |(_, b)| score > b) {
            best = Some((sample, score));
        }
    }

    best.map(|(sample, _)| sample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use psf_common::QueryKind;

    fn query(text: &str, kind: QueryKind) -> Query {
        Query {
            text: text.into(),
            kind,
        }
    }

    #[tokio::test]
    async fn test_exact_key_match() {
        let result = DemoAdapter::new()
            .search(&query("iPhone 15 Pro", QueryKind::Name))
            .await
            .unwrap();
        assert_eq!(result.brand.as_deref(), Some("Apple"));
        assert_eq!(result.specifications["os"], "iOS 17");
        assert_eq!(result.source, "demo");
        assert_eq!(result.citations[0], "apple.com");
    }

    #[tokio::test]
    async fn test_model_number_match() {
        let result = DemoAdapter::new()
            .search(&query("P2422H", QueryKind::Model))
            .await
            .unwrap();
        assert_eq!(result.brand.as_deref(), Some("Dell"));
    }

    #[tokio::test]
    async fn test_loose_word_match() {
        let adapter = DemoAdapter::new();
        let r = adapter.search(&query("dell monitor", QueryKind::Name)).await.unwrap();
        assert_eq!(r.model.as_deref(), Some("P2422H"));

        let r = adapter.search(&query("Galaxy phone", QueryKind::Name)).await.unwrap();
        assert_eq!(r.model.as_deref(), Some("Galaxy S24"));

        let r = adapter.search(&query("Tesla", QueryKind::Name)).await.unwrap();
        assert_eq!(r.model.as_deref(), Some("Model 3"));
    }

    #[tokio::test]
    async fn test_gtin_sample() {
        let r = DemoAdapter::new()
            .search(&query("0123-4567-8905", QueryKind::ArticleNumber))
            .await
            .unwrap();
        assert_eq!(r.brand.as_deref(), Some("Sample Brand"));
        assert_eq!(r.specifications["gtin"], "012345678905");
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let err = DemoAdapter::new()
            .search(&query("Nokia 3310", QueryKind::Name))
            .await
            .unwrap_err();
        match err {
            AdapterError::NotFound(msg) => assert!(msg.contains("iphone 15 pro")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
