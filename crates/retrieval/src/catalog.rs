//! The built-in documentation catalog.
//!
//! Product entries cover the support topics; the general-knowledge entries
//! are only loaded when the assistant may answer beyond the product docs.

use supportdesk_core::docs::{DocEntry, DocumentStore};

/// Product support documentation.
pub fn product_docs() -> DocumentStore {
    DocumentStore::new(product_entries()).unwrap_or_default()
}

/// General-knowledge entries used by the open answer policy.
pub fn general_docs() -> DocumentStore {
    DocumentStore::new(general_entries()).unwrap_or_default()
}

/// The catalog the service starts with: product docs, optionally followed
/// by the general-knowledge entries.
pub fn builtin_catalog(include_general: bool) -> DocumentStore {
    let mut docs = product_entries();
    if include_general {
        docs.extend(general_entries());
    }
    DocumentStore::new(docs).unwrap_or_default()
}

fn product_entries() -> Vec<DocEntry> {
    vec![
        DocEntry::new(
            "Reset Password",
            "Users can reset password from Settings > Security. Click 'Forgot Password' on the login page, enter your email, and follow the link sent to your inbox to create a new password.",
            ["reset", "password", "security", "settings", "change password", "forgot password"],
        ),
        DocEntry::new(
            "Refund Policy",
            "Refunds are allowed within 7 days of purchase. To request a refund, go to Orders > Select Order > Request Refund. Refunds are processed within 3-5 business days.",
            ["refund", "return", "money back", "purchase", "cancel", "7 days"],
        ),
        DocEntry::new(
            "Account Settings",
            "You can manage your account settings by navigating to Settings > Account. From there you can update your profile, email, and notification preferences.",
            ["account", "settings", "profile", "email", "notifications", "preferences"],
        ),
        DocEntry::new(
            "Billing",
            "Billing information can be managed from Settings > Billing. You can update your payment method, view invoices, and change your subscription plan.",
            ["billing", "payment", "invoice", "subscription", "plan", "credit card"],
        ),
        DocEntry::new(
            "Contact Support",
            "You can contact our support team by emailing support@example.com or by using the in-app chat feature available 24/7.",
            ["contact", "support", "help", "email", "chat", "customer service"],
        ),
    ]
}

fn general_entries() -> Vec<DocEntry> {
    vec![
        DocEntry::new(
            "Artificial Intelligence",
            "Artificial Intelligence (AI) is the simulation of human intelligence by machines. It includes machine learning, natural language processing, computer vision, and robotics. AI systems can learn from data, recognize patterns, and make decisions with minimal human intervention.",
            ["ai", "artificial intelligence", "machine learning", "ml", "what is ai", "deep learning"],
        ),
        DocEntry::new(
            "Chief Minister of Andhra Pradesh",
            "The current Chief Minister (CM) of Andhra Pradesh is N. Chandrababu Naidu, who took office in June 2024. He is the leader of the Telugu Desam Party (TDP).",
            ["ap cm", "andhra pradesh", "chief minister", "cm", "chandrababu", "tdp", "who ap cm"],
        ),
        DocEntry::new(
            "Prime Minister of India",
            "The current Prime Minister of India is Narendra Modi. He has been serving as the PM since May 2014 and is a member of the Bharatiya Janata Party (BJP).",
            ["pm", "prime minister", "india pm", "modi", "narendra modi", "who is pm"],
        ),
        DocEntry::new(
            "Weather Information",
            "I can provide general weather tips. For current weather, please check a weather service like weather.com. Generally, dress in layers, carry an umbrella during monsoon season, and stay hydrated in summer.",
            ["weather", "temperature", "rain", "sunny", "forecast", "climate"],
        ),
        DocEntry::new(
            "Programming Languages",
            "Popular programming languages include Python (great for AI/ML and beginners), JavaScript (web development), Java (enterprise applications), C++ (systems programming), TypeScript (typed JavaScript), and Rust (performance and safety).",
            ["programming", "language", "python", "javascript", "java", "coding", "code", "developer"],
        ),
        DocEntry::new(
            "What is Machine Learning",
            "Machine Learning (ML) is a subset of AI that enables systems to learn and improve from experience without being explicitly programmed. Types include supervised learning, unsupervised learning, and reinforcement learning.",
            ["machine learning", "ml", "supervised", "unsupervised", "neural network", "model training"],
        ),
        DocEntry::new(
            "Internet and Web",
            "The Internet is a global network of interconnected computers. The World Wide Web (WWW) is a system of interlinked hypertext documents accessed via the Internet using browsers like Chrome, Firefox, and Safari.",
            ["internet", "web", "www", "browser", "online", "website", "network"],
        ),
        DocEntry::new(
            "Mathematics Basics",
            "Mathematics is the study of numbers, quantities, shapes, and patterns. Key branches include algebra, geometry, calculus, statistics, and trigonometry. Math is fundamental to science, engineering, and technology.",
            ["math", "mathematics", "algebra", "geometry", "calculus", "statistics", "numbers"],
        ),
        DocEntry::new(
            "Science Overview",
            "Science is the systematic study of the natural world through observation and experimentation. Major branches include Physics (study of matter and energy), Chemistry (study of substances), and Biology (study of living organisms).",
            ["science", "physics", "chemistry", "biology", "experiment", "research", "scientific"],
        ),
        DocEntry::new(
            "History Overview",
            "History is the study of past events. Key periods include Ancient civilizations (Egypt, Rome, Greece), the Medieval period, the Renaissance, the Industrial Revolution, and Modern history including World Wars and the Digital Age.",
            ["history", "ancient", "medieval", "war", "civilization", "historical", "past"],
        ),
        DocEntry::new(
            "Health and Wellness",
            "Good health involves balanced nutrition, regular exercise (at least 30 minutes daily), adequate sleep (7-9 hours), stress management, and regular medical check-ups. Drink at least 8 glasses of water daily.",
            ["health", "wellness", "exercise", "nutrition", "sleep", "fitness", "diet", "medical"],
        ),
        DocEntry::new(
            "Geography",
            "Earth has 7 continents (Asia, Africa, North America, South America, Antarctica, Europe, Australia) and 5 oceans (Pacific, Atlantic, Indian, Southern, Arctic). The world has 195 recognized countries.",
            ["geography", "continent", "ocean", "country", "earth", "world", "map", "capital"],
        ),
        DocEntry::new(
            "Space and Astronomy",
            "Our solar system has 8 planets: Mercury, Venus, Earth, Mars, Jupiter, Saturn, Uranus, and Neptune. The Sun is a star at the center. The universe is approximately 13.8 billion years old.",
            ["space", "planet", "solar system", "sun", "moon", "star", "universe", "astronomy", "nasa"],
        ),
    ]
}
