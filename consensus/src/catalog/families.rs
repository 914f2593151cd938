//! Domain-family tables for the built-in specialist pool.
//!
//! Each table row is `(slug, label, keywords, affinities)`. The species is
//! `<family prefix>.<slug>`; language rows additionally fan out into the
//! sub-specialties in [`LANGUAGE_SPECIALTIES`].

use super::SpecialistTemplate;

type Row = (
    &'static str,
    &'static str,
    &'static [&'static str],
    &'static [&'static str],
);

/// `(suffix, label suffix, extra keywords)` applied to every language row
pub const LANGUAGE_SPECIALTIES: &[(&str, &str, &[&str])] = &[
    (
        "debug",
        "Debugger",
        &["debug", "bug", "error", "fix", "crash", "exception", "stack trace"],
    ),
    (
        "perf",
        "Performance",
        &["performance", "slow", "optimize", "profile", "latency", "memory leak"],
    ),
    (
        "test",
        "Testing",
        &["test", "tests", "mock", "coverage", "assert", "unit test"],
    ),
    (
        "arch",
        "Architecture",
        &["architecture", "design", "pattern", "refactor", "module", "dependency injection"],
    ),
];

const IDE_AFFINITIES: &[&str] = &["com.microsoft.vscode", "dev.zed.zed"];

const LANGUAGES: &[Row] = &[
    ("swift", "Swift", &["swift", "swiftui", "xcode", "ios", "uikit", "combine", "async await"], &["com.apple.dt.xcode"]),
    ("objc", "Objective-C", &["objective-c", "objc", "nsobject", "cocoa"], &["com.apple.dt.xcode"]),
    ("rust", "Rust", &["rust", "cargo", "borrow", "lifetime", "trait", "tokio", "borrow checker"], &["com.jetbrains.rustrover"]),
    ("python", "Python", &["python", "pip", "django", "flask", "pandas", "numpy", "virtual environment"], &["com.jetbrains.pycharm"]),
    ("javascript", "JavaScript", &["javascript", "js", "node", "npm", "react", "dom"], &["com.jetbrains.webstorm"]),
    ("typescript", "TypeScript", &["typescript", "ts", "tsc", "interface", "generics", "type guard"], &["com.jetbrains.webstorm"]),
    ("go", "Go", &["go", "golang", "goroutine", "channel", "gofmt"], &["com.jetbrains.goland"]),
    ("java", "Java", &["java", "jvm", "maven", "gradle", "spring", "spring boot"], &["com.jetbrains.intellij"]),
    ("kotlin", "Kotlin", &["kotlin", "coroutine", "android", "jetpack compose"], &["com.google.android.studio", "com.jetbrains.intellij"]),
    ("csharp", "C#", &["c#", "csharp", "dotnet", "nuget", "linq", "unity"], &["com.microsoft.visual-studio"]),
    ("cpp", "C++", &["c++", "cpp", "cmake", "template", "stl", "smart pointer"], &["com.jetbrains.clion"]),
    ("c", "C", &["c", "malloc", "pointer", "segfault", "header", "undefined behavior"], &["com.jetbrains.clion"]),
    ("ruby", "Ruby", &["ruby", "rails", "gem", "bundler", "ruby on rails"], &["com.jetbrains.rubymine"]),
    ("php", "PHP", &["php", "laravel", "composer", "wordpress"], &["com.jetbrains.phpstorm"]),
    ("scala", "Scala", &["scala", "sbt", "akka", "implicit"], &["com.jetbrains.intellij"]),
    ("haskell", "Haskell", &["haskell", "monad", "ghc", "cabal", "type class"], &[]),
    ("elixir", "Elixir", &["elixir", "phoenix", "genserver", "beam", "otp"], &[]),
    ("dart", "Dart", &["dart", "flutter", "widget", "pubspec"], &["com.google.android.studio"]),
    ("lua", "Lua", &["lua", "luajit", "neovim", "metatable"], &[]),
    ("r", "R", &["r", "tidyverse", "ggplot", "dplyr", "data frame"], &["com.rstudio.desktop"]),
    ("julia", "Julia", &["julia", "multiple dispatch", "pkg"], &[]),
    ("sql", "SQL", &["sql", "query", "join", "index", "postgres", "sqlite", "foreign key"], &["com.tinyapp.tableplus"]),
    ("shell", "Shell", &["bash", "shell", "zsh", "script", "grep", "sed", "awk"], &["com.apple.terminal", "com.googlecode.iterm2"]),
    ("html", "HTML/CSS", &["html", "css", "flexbox", "grid", "tailwind", "media query"], &[]),
];

const CREATIVE: &[Row] = &[
    ("writing.fiction", "Fiction Writer", &["story", "novel", "character", "plot", "chapter", "short story"], &["com.literatureandlatte.scrivener"]),
    ("writing.poetry", "Poet", &["poem", "poetry", "rhyme", "verse", "haiku"], &[]),
    ("writing.copy", "Copywriter", &["copy", "headline", "tagline", "slogan", "landing page"], &[]),
    ("writing.screenplay", "Screenwriter", &["screenplay", "script", "scene", "dialogue", "logline"], &["com.quoteunquoteapps.highland2"]),
    ("writing.editing", "Editor", &["edit", "proofread", "grammar", "tone", "rewrite", "word choice"], &["com.apple.pages", "com.microsoft.word"]),
    ("music.theory", "Music Theorist", &["chord", "scale", "harmony", "melody", "key", "chord progression"], &[]),
    ("music.production", "Producer", &["mix", "mixing", "mastering", "daw", "synth", "eq", "sound design"], &["com.apple.logic10", "com.ableton.live"]),
    ("music.lyrics", "Lyricist", &["lyrics", "song", "chorus", "hook", "verse"], &[]),
    ("music.discovery", "Music Curator", &["playlist", "album", "artist", "genre", "recommend", "similar artists"], &["com.spotify.client", "com.apple.music"]),
    ("design.ui", "UI Designer", &["ui", "layout", "figma", "component", "spacing", "design system"], &["com.figma.desktop", "com.bohemiancoding.sketch3"]),
    ("design.color", "Color Specialist", &["color", "palette", "contrast", "gradient", "color scheme"], &["com.figma.desktop"]),
    ("design.typography", "Typographer", &["font", "typeface", "kerning", "typography", "line height"], &[]),
    ("design.logo", "Brand Designer", &["logo", "brand", "identity", "icon", "brand identity"], &["com.adobe.illustrator"]),
    ("art.illustration", "Illustrator", &["draw", "drawing", "sketch", "illustration", "character design"], &["com.adobe.illustrator", "com.seriflabs.affinitydesigner"]),
    ("art.photo", "Photo Editor", &["photo", "lightroom", "exposure", "retouch", "color grading"], &["com.adobe.photoshop", "com.adobe.lightroomcc"]),
    ("video.editing", "Video Editor", &["video", "cut", "timeline", "transition", "render", "b roll"], &["com.apple.finalcut", "com.blackmagic-design.davinciresolve"]),
    ("video.youtube", "Video Strategist", &["youtube", "thumbnail", "channel", "views", "video idea"], &[]),
    ("game.design", "Game Designer", &["game", "level", "mechanic", "player", "game loop", "level design"], &["com.unity3d.unityhub"]),
    ("brainstorm", "Idea Generator", &["idea", "ideas", "brainstorm", "inspiration", "creative block"], &[]),
    ("worldbuilding", "Worldbuilder", &["world", "lore", "magic system", "faction", "map"], &[]),
];

const INFRASTRUCTURE: &[Row] = &[
    ("docker", "Docker", &["docker", "container", "dockerfile", "image", "docker compose"], &["com.docker.docker"]),
    ("kubernetes", "Kubernetes", &["kubernetes", "k8s", "pod", "helm", "kubectl", "deployment"], &[]),
    ("aws", "AWS", &["aws", "s3", "lambda", "ec2", "iam", "cloudformation"], &[]),
    ("gcp", "GCP", &["gcp", "bigquery", "cloud run", "gke", "firebase"], &[]),
    ("azure", "Azure", &["azure", "blob", "aks", "app service", "active directory"], &[]),
    ("terraform", "Terraform", &["terraform", "hcl", "state", "module", "infrastructure as code"], &[]),
    ("ci", "CI/CD", &["ci", "pipeline", "github actions", "build", "workflow", "continuous integration"], &[]),
    ("deploy", "Release Engineer", &["deploy", "release", "rollback", "ship", "staging", "blue green"], &[]),
    ("networking", "Network Engineer", &["dns", "tcp", "http", "tls", "proxy", "load balancer"], &[]),
    ("security", "Security Engineer", &["security", "vulnerability", "auth", "oauth", "encryption", "xss", "sql injection"], &[]),
    ("observability", "Observability", &["logs", "metrics", "tracing", "grafana", "prometheus", "alert"], &[]),
    ("database.postgres", "Postgres Admin", &["postgres", "vacuum", "replication", "pg", "connection pool"], &["com.tinyapp.tableplus"]),
    ("database.redis", "Redis", &["redis", "cache", "pubsub", "ttl", "cache invalidation"], &[]),
    ("database.mongo", "MongoDB", &["mongo", "mongodb", "document", "aggregation", "atlas"], &[]),
    ("linux", "Linux Admin", &["linux", "systemd", "ssh", "permissions", "kernel", "cron"], &["com.apple.terminal", "com.googlecode.iterm2"]),
    ("git", "Git", &["git", "merge", "rebase", "branch", "commit", "merge conflict"], &["com.github.githubclient", "com.fournova.tower3"]),
    ("serverless", "Serverless", &["serverless", "edge", "function", "cold start", "vercel"], &[]),
    ("cost", "Cloud Cost", &["cost", "billing", "budget", "reserved", "cloud bill"], &[]),
];

const RESEARCH: &[Row] = &[
    ("papers", "Paper Reader", &["paper", "arxiv", "abstract", "citation", "literature review"], &["com.apple.preview", "com.readdle.pdfexpert"]),
    ("statistics", "Statistician", &["statistics", "regression", "p value", "variance", "hypothesis", "confidence interval"], &[]),
    ("ml", "ML Researcher", &["model", "training", "dataset", "neural", "gradient", "machine learning"], &["com.jupyter.lab"]),
    ("data.analysis", "Data Analyst", &["data", "analysis", "chart", "csv", "spreadsheet", "pivot table"], &["com.microsoft.excel", "com.apple.numbers"]),
    ("physics", "Physicist", &["physics", "quantum", "energy", "force", "relativity"], &[]),
    ("chemistry", "Chemist", &["chemistry", "molecule", "reaction", "compound", "periodic table"], &[]),
    ("biology", "Biologist", &["biology", "cell", "gene", "protein", "evolution", "dna"], &[]),
    ("math", "Mathematician", &["math", "proof", "theorem", "equation", "integral", "linear algebra"], &[]),
    ("history", "Historian", &["history", "war", "empire", "century", "historical"], &[]),
    ("philosophy", "Philosopher", &["philosophy", "ethics", "meaning", "consciousness", "free will"], &[]),
    ("economics", "Economist", &["economics", "inflation", "market", "gdp", "supply and demand"], &[]),
    ("law", "Legal Researcher", &["law", "legal", "contract", "copyright", "terms of service"], &[]),
    ("medicine", "Medical Researcher", &["medicine", "symptom", "disease", "clinical", "clinical trial"], &[]),
    ("learning", "Tutor", &["learn", "explain", "understand", "tutorial", "beginner", "study plan"], &[]),
    ("factcheck", "Fact Checker", &["fact", "source", "verify", "claim", "true", "fact check"], &["com.apple.safari", "com.google.chrome"]),
    ("summarize", "Summarizer", &["summarize", "summary", "tldr", "key points", "article"], &["com.apple.safari", "com.google.chrome"]),
];

const BUSINESS: &[Row] = &[
    ("finance.personal", "Personal Finance", &["budget", "savings", "debt", "retirement", "emergency fund"], &[]),
    ("finance.investing", "Investing", &["stock", "invest", "portfolio", "etf", "dividend", "index fund"], &[]),
    ("finance.accounting", "Accountant", &["invoice", "tax", "expense", "bookkeeping", "balance sheet"], &["com.intuit.quickbooks"]),
    ("marketing", "Marketer", &["marketing", "campaign", "audience", "funnel", "conversion rate"], &[]),
    ("marketing.seo", "SEO", &["seo", "keyword", "ranking", "backlink", "search engine"], &[]),
    ("marketing.social", "Social Media", &["twitter", "instagram", "linkedin", "post", "engagement", "social media"], &[]),
    ("product", "Product Manager", &["product", "roadmap", "feature", "user story", "mvp", "product market fit"], &["com.linear", "com.atlassian.jira"]),
    ("startup", "Startup Advisor", &["startup", "founder", "pitch", "fundraising", "pitch deck"], &["com.apple.keynote"]),
    ("sales", "Sales Coach", &["sales", "lead", "prospect", "close", "cold email"], &["com.salesforce"]),
    ("email", "Email Writer", &["email", "reply", "follow up", "newsletter", "subject line"], &["com.apple.mail", "com.microsoft.outlook"]),
    ("meetings", "Meeting Facilitator", &["meeting", "agenda", "notes", "standup", "action items"], &["us.zoom.xos", "com.microsoft.teams"]),
    ("negotiation", "Negotiator", &["negotiate", "salary", "offer", "deal", "counter offer"], &[]),
    ("hiring", "Recruiter", &["hire", "hiring", "interview", "resume", "job description"], &[]),
    ("strategy", "Strategist", &["strategy", "competitor", "swot", "positioning", "business model"], &[]),
    ("legal.contracts", "Contract Reviewer", &["nda", "clause", "agreement", "liability", "contract review"], &[]),
    ("presentation", "Presentation Coach", &["slides", "presentation", "deck", "keynote", "public speaking"], &["com.apple.keynote", "com.microsoft.powerpoint"]),
];

const WELLBEING: &[Row] = &[
    ("sleep", "Sleep Coach", &["sleep", "insomnia", "tired", "bedtime", "cant sleep"], &[]),
    ("stress", "Stress Relief", &["stress", "anxious", "anxiety", "overwhelmed", "calm down"], &[]),
    ("focus", "Focus Coach", &["focus", "distracted", "procrastinate", "pomodoro", "deep work"], &[]),
    ("meditation", "Meditation Guide", &["meditate", "meditation", "breathe", "mindfulness", "breathing exercise"], &["com.calm.calm", "com.headspace.headspace"]),
    ("fitness", "Fitness Coach", &["workout", "exercise", "stretch", "gym", "posture"], &[]),
    ("nutrition", "Nutritionist", &["food", "diet", "meal", "protein", "healthy", "meal prep"], &[]),
    ("mood", "Mood Companion", &["sad", "happy", "lonely", "mood", "feel", "bad day"], &[]),
    ("burnout", "Burnout Recovery", &["burnout", "exhausted", "break", "rest", "work life balance"], &[]),
    ("habits", "Habit Builder", &["habit", "routine", "streak", "morning routine", "journal"], &[]),
    ("ergonomics", "Ergonomics", &["desk", "chair", "wrist", "eyes", "screen time"], &[]),
    ("music.relax", "Relaxation DJ", &["relax", "chill", "ambient", "lofi", "white noise"], &["com.spotify.client", "com.apple.music"]),
    ("gratitude", "Gratitude Coach", &["grateful", "gratitude", "thankful", "reflection"], &[]),
];

const LOCALIZED: &[Row] = &[
    ("es", "Asistente en Español", &["hola", "gracias", "ayuda", "cómo", "por qué", "por favor", "qué"], &[]),
    ("es.codigo", "Programación en Español", &["código", "error", "programar", "función", "arreglar", "fallo"], &["com.apple.dt.xcode", "com.microsoft.vscode"]),
    ("es.escritura", "Escritura Creativa", &["historia", "poema", "escribir", "canción", "personaje"], &[]),
    ("es.bienestar", "Bienestar", &["dormir", "estrés", "cansado", "ansiedad", "descansar"], &[]),
    ("fr", "Assistant Français", &["bonjour", "merci", "comment", "pourquoi", "aide"], &[]),
    ("de", "Deutscher Assistent", &["hallo", "danke", "wie", "warum", "hilfe"], &[]),
    ("pt", "Assistente em Português", &["olá", "obrigado", "como", "ajuda", "porque"], &[]),
    ("it", "Assistente Italiano", &["ciao", "grazie", "come", "perché", "aiuto"], &[]),
    ("ja", "日本語アシスタント", &["こんにちは", "ありがとう", "どうやって", "なぜ", "日本語"], &[]),
    ("travel", "Travel Planner", &["travel", "flight", "hotel", "itinerary", "visa", "time zone"], &[]),
    ("translate", "Translator", &["translate", "translation", "language", "phrase", "how do you say"], &["com.apple.translate", "com.deepl.mac"]),
    ("culture", "Cultural Guide", &["culture", "etiquette", "custom", "holiday", "tradition"], &[]),
];

fn rows(prefix: &'static str, rows: &'static [Row]) -> impl Iterator<Item = SpecialistTemplate> {
    rows.iter().map(move |&(slug, label, keywords, affinities)| {
        let domain = slug.split('.').next().unwrap_or(slug);
        SpecialistTemplate::new(format!("{prefix}.{slug}"), label, domain, keywords)
            .with_affinities(affinities)
    })
}

/// Language entries plus one sub-specialty per [`LANGUAGE_SPECIALTIES`] row
pub fn languages() -> Vec<SpecialistTemplate> {
    let mut out = Vec::with_capacity(LANGUAGES.len() * (LANGUAGE_SPECIALTIES.len() + 1));
    for mut base in rows("code", LANGUAGES) {
        for ide in IDE_AFFINITIES {
            base.affinities.push(ide.to_string());
        }
        for (suffix, label_suffix, extra) in LANGUAGE_SPECIALTIES {
            out.push(base.specialize(suffix, label_suffix, extra));
        }
        out.push(base);
    }
    out
}

pub fn creative() -> Vec<SpecialistTemplate> {
    rows("creative", CREATIVE).collect()
}

pub fn infrastructure() -> Vec<SpecialistTemplate> {
    rows("infra", INFRASTRUCTURE).collect()
}

pub fn research() -> Vec<SpecialistTemplate> {
    rows("research", RESEARCH).collect()
}

pub fn business() -> Vec<SpecialistTemplate> {
    rows("business", BUSINESS).collect()
}

pub fn wellbeing() -> Vec<SpecialistTemplate> {
    rows("wellbeing", WELLBEING).collect()
}

pub fn localized() -> Vec<SpecialistTemplate> {
    rows("locale", LOCALIZED).collect()
}

/// Every family, in a stable order
pub fn build_all() -> Vec<SpecialistTemplate> {
    let mut all = languages();
    all.extend(creative());
    all.extend(infrastructure());
    all.extend(research());
    all.extend(business());
    all.extend(wellbeing());
    all.extend(localized());
    all
}
