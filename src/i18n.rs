use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Language {
    pub code: &'static str,
    pub name: &'static str,
    pub native_name: &'static str,
    pub flag: &'static str,
}

pub(crate) const DEFAULT_LANGUAGE: &str = "en";

pub(crate) const SUPPORTED_LANGUAGES: &[Language] = &[
    Language { code: "en", name: "English", native_name: "English", flag: "🇺🇸" },
    Language { code: "ms", name: "Malay", native_name: "Bahasa Melayu", flag: "🇲🇾" },
    Language { code: "zh", name: "Chinese", native_name: "中文", flag: "🇨🇳" },
    Language { code: "es", name: "Spanish", native_name: "Español", flag: "🇪🇸" },
    Language { code: "fr", name: "French", native_name: "Français", flag: "🇫🇷" },
    Language { code: "de", name: "German", native_name: "Deutsch", flag: "🇩🇪" },
    Language { code: "it", name: "Italian", native_name: "Italiano", flag: "🇮🇹" },
    Language { code: "pt", name: "Portuguese", native_name: "Português", flag: "🇵🇹" },
    Language { code: "ar", name: "Arabic", native_name: "العربية", flag: "🇸🇦" },
    Language { code: "ja", name: "Japanese", native_name: "日本語", flag: "🇯🇵" },
    Language { code: "ko", name: "Korean", native_name: "한국어", flag: "🇰🇷" },
    Language { code: "th", name: "Thai", native_name: "ไทย", flag: "🇹🇭" },
    Language { code: "vi", name: "Vietnamese", native_name: "Tiếng Việt", flag: "🇻🇳" },
    Language { code: "id", name: "Indonesian", native_name: "Bahasa Indonesia", flag: "🇮🇩" },
];

const EN: &[(&str, &str)] = &[
    ("home", "Home"),
    ("news", "News"),
    ("transfers", "Transfers"),
    ("matches", "Matches"),
    ("analysis", "Analysis"),
    ("allPosts", "All Posts"),
    ("readMore", "Read More"),
    ("viewAll", "View All"),
    ("latestNews", "Latest Football News"),
    ("featuredStories", "Featured Stories"),
    ("recentTransfers", "Recent Transfers"),
    ("upcomingMatches", "Upcoming Matches"),
    ("confirmed", "Confirmed"),
    ("rumors", "Rumors"),
    ("previews", "Previews"),
    ("reports", "Reports"),
    ("tactical", "Tactical"),
    ("opinion", "Opinion"),
    ("playerAnalysis", "Player Analysis"),
    ("teamAnalysis", "Team Analysis"),
    ("category", "Category"),
    ("tag", "Tag"),
    ("by", "By"),
    ("noPosts", "No posts yet."),
    ("lastUpdated", "Last updated"),
];

const MS: &[(&str, &str)] = &[
    ("home", "Laman Utama"),
    ("news", "Berita"),
    ("transfers", "Perpindahan"),
    ("matches", "Perlawanan"),
    ("analysis", "Analisis"),
    ("allPosts", "Semua Artikel"),
    ("readMore", "Baca Lagi"),
    ("viewAll", "Lihat Semua"),
    ("latestNews", "Berita Bola Sepak Terkini"),
    ("featuredStories", "Cerita Pilihan"),
    ("recentTransfers", "Perpindahan Terkini"),
    ("upcomingMatches", "Perlawanan Akan Datang"),
    ("confirmed", "Disahkan"),
    ("rumors", "Khabar Angin"),
    ("previews", "Pratonton"),
    ("reports", "Laporan"),
    ("tactical", "Taktikal"),
    ("opinion", "Pendapat"),
    ("category", "Kategori"),
    ("by", "Oleh"),
    ("noPosts", "Tiada artikel lagi."),
    ("lastUpdated", "Kemas kini terakhir"),
];

const ES: &[(&str, &str)] = &[
    ("home", "Inicio"),
    ("news", "Noticias"),
    ("transfers", "Fichajes"),
    ("matches", "Partidos"),
    ("analysis", "Análisis"),
    ("readMore", "Leer más"),
    ("latestNews", "Últimas noticias de fútbol"),
    ("featuredStories", "Historias destacadas"),
    ("confirmed", "Confirmados"),
    ("rumors", "Rumores"),
    ("previews", "Previas"),
    ("reports", "Crónicas"),
    ("lastUpdated", "Última actualización"),
];

const ID: &[(&str, &str)] = &[
    ("home", "Beranda"),
    ("news", "Berita"),
    ("transfers", "Transfer"),
    ("matches", "Pertandingan"),
    ("analysis", "Analisis"),
    ("readMore", "Baca Selengkapnya"),
    ("latestNews", "Berita Sepak Bola Terbaru"),
    ("featuredStories", "Cerita Unggulan"),
    ("rumors", "Rumor"),
    ("lastUpdated", "Terakhir diperbarui"),
];

pub(crate) fn find_language(code: &str) -> Option<&'static Language> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|l| l.code.eq_ignore_ascii_case(code))
}

fn table(code: &str) -> &'static [(&'static str, &'static str)] {
    match code {
        "ms" => MS,
        "es" => ES,
        "id" => ID,
        _ => EN,
    }
}

/// UI strings for `code`, with English filling every key the language lacks.
pub(crate) fn labels(code: &str) -> BTreeMap<&'static str, &'static str> {
    let mut labels: BTreeMap<_, _> = EN.iter().copied().collect();
    labels.extend(table(code).iter().copied());
    labels
}
