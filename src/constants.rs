pub const DEFAULT_PORT: u16 = 3001;

pub const DEFAULT_UPSTREAM_URL: &str = "http://localhost:8000";

pub const SCRAPE_PATH: &str = "/scrape";

pub mod cache {

    pub const DEFAULT_TTL_SECONDS: u64 = 5 * 60;
}

pub mod upstream {

    pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

    pub const USER_AGENT: &str = "Cyber50/1.0";
}

pub mod limits {

    pub const DEFAULT_MAX_RESULTS: u32 = 50;

    /// Tenders with this many days left or fewer are flagged as closing soon.
    pub const CLOSING_SOON_DAYS: u32 = 2;

    pub const MAX_SEARCH_LENGTH: usize = 200;
}

/// English and Arabic procurement keywords sent with every scrape request.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "Cybersecurity",
    "Security",
    "Information Security",
    "Network Security",
    "Data Protection",
    "Cyber Threat",
    "Incident Response",
    "Penetration Testing",
    "Vulnerability Assessment",
    "RFP",
    "IT Security",
    "Endpoint Security",
    "Firewall",
    "Intrusion Detection",
    "Intrusion Prevention",
    "SIEM",
    "SOC",
    "Malware Analysis",
    "Threat Intelligence",
    "Phishing",
    "Ransomware",
    "Cloud Security",
    "Application Security",
    "Web Security",
    "Zero Trust",
    "Identity Management",
    "Access Control",
    "Encryption",
    "Data Loss Prevention",
    "Security Audit",
    "ISO 27001",
    "NIST",
    "CIS Controls",
    "Cyber Defense",
    "Red Team",
    "Blue Team",
    "Security Operations",
    "Vulnerability Management",
    "Security Policy",
    "Security Governance",
    "Cyber Risk",
    "Cyber Resilience",
    "Security Monitoring",
    "Threat Hunting",
    "Digital Forensics",
    "SOC-as-a-Service",
    "MDR",
    "Cloud Compliance",
    "Security Awareness Training",
    "Endpoint Detection",
    "Application Firewall",
    "SIEM Integration",
    "Patch Management",
    "أمن سيبراني",
    "الأمن المعلوماتي",
    "حماية البيانات",
    "الهجمات السيبرانية",
    "الاستجابة للحوادث",
    "اختبار الاختراق",
    "تقييم الثغرات",
    "حماية الشبكات",
    "سياسة الأمان",
    "حوكمة أمن المعلومات",
    "تدقيق أمني",
    "الامتثال الأمني",
    "الوعي الأمني",
    "تشخيص البرمجيات الخبيثة",
    "الهندسة العكسية",
    "تحليل التهديدات",
    "إدارة الهوية",
    "التحكم بالوصول",
    "تشفير البيانات",
    "خدمات الأمن السحابي",
    "إدارة المخاطر السيبرانية",
    "الاختبارات الأمنية",
    "الحماية من الفيروسات",
    "الجرائم الإلكترونية",
];
