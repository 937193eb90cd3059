use serde::Serialize;

/// A listable kind of site content, addressed by its URL slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    Blogs,
    Products,
    Projects,
    Services,
    Team,
    Testimonials,
    Faqs,
    Careers,
    HeroSlides,
    Gallery,
    Certifications,
    Partners,
    Clients,
    Awards,
    News,
    Events,
    Downloads,
    CaseStudies,
    Brochures,
}

impl ContentType {
    pub const ALL: [ContentType; 19] = [
        ContentType::Blogs,
        ContentType::Products,
        ContentType::Projects,
        ContentType::Services,
        ContentType::Team,
        ContentType::Testimonials,
        ContentType::Faqs,
        ContentType::Careers,
        ContentType::HeroSlides,
        ContentType::Gallery,
        ContentType::Certifications,
        ContentType::Partners,
        ContentType::Clients,
        ContentType::Awards,
        ContentType::News,
        ContentType::Events,
        ContentType::Downloads,
        ContentType::CaseStudies,
        ContentType::Brochures,
    ];

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|content_type| content_type.slug() == slug)
    }

    pub fn slug(&self) -> &'static str {
        match self {
            ContentType::Blogs => "blogs",
            ContentType::Products => "products",
            ContentType::Projects => "projects",
            ContentType::Services => "services",
            ContentType::Team => "team",
            ContentType::Testimonials => "testimonials",
            ContentType::Faqs => "faqs",
            ContentType::Careers => "careers",
            ContentType::HeroSlides => "hero-slides",
            ContentType::Gallery => "gallery",
            ContentType::Certifications => "certifications",
            ContentType::Partners => "partners",
            ContentType::Clients => "clients",
            ContentType::Awards => "awards",
            ContentType::News => "news",
            ContentType::Events => "events",
            ContentType::Downloads => "downloads",
            ContentType::CaseStudies => "case-studies",
            ContentType::Brochures => "brochures",
        }
    }

    /// MongoDB collection backing this type.
    pub fn collection(&self) -> &'static str {
        match self {
            ContentType::Team => "teammembers",
            ContentType::HeroSlides => "heroslides",
            ContentType::Gallery => "galleries",
            ContentType::CaseStudies => "casestudies",
            other => other.slug(),
        }
    }

    /// Text fields matched by the `search` parameter.
    pub fn searchable_fields(&self) -> &'static [&'static str] {
        match self {
            ContentType::Blogs => &["title", "excerpt", "content", "author", "tags"],
            ContentType::Products => &["name", "description", "category", "brand"],
            ContentType::Projects => &["title", "description", "location", "category"],
            ContentType::Services => &["title", "description"],
            ContentType::Team => &["name", "designation", "bio"],
            ContentType::Testimonials => &["name", "company", "content"],
            ContentType::Faqs => &["question", "answer", "category"],
            ContentType::Careers => &["title", "department", "location", "description"],
            ContentType::HeroSlides => &["title", "subtitle"],
            ContentType::Gallery => &["title", "category"],
            ContentType::Certifications => &["title", "issuer"],
            ContentType::Partners => &["name", "description"],
            ContentType::Clients => &["name", "industry"],
            ContentType::Awards => &["title", "awardedBy"],
            ContentType::News => &["title", "summary", "content"],
            ContentType::Events => &["title", "description", "venue"],
            ContentType::Downloads => &["title", "description", "category"],
            ContentType::CaseStudies => &["title", "client", "summary"],
            ContentType::Brochures => &["title", "description"],
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}
