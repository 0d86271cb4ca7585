//! Static matching tables for the relevance classifier.
//!
//! Questions arrive in Portuguese or English, so both are covered. Everything
//! here is matched against the lower-cased, trimmed question.

use crate::models::Section;

/// Phrase-shaped patterns, checked before keywords. Table order matters: it is
/// the order in which context matches survive the three-section cap.
pub const CONTEXT_PATTERNS: &[(Section, &[&str])] = &[
    (
        Section::AcademicBackground,
        &[
            r"formou.*em",
            r"forma[çc][ãa]o acad[êe]mica",
            r"onde (ele )?estud(ou|a)",
            r"qual (a |sua )?(gradua[çc][ãa]o|faculdade|universidade)",
            r"graduated (from|in)",
            r"(what|which) (degree|university|college)",
            r"where did (he|you) study",
        ],
    ),
    (
        Section::ProfessionalExperience,
        &[
            r"onde (ele )?trabalh(ou|a)",
            r"experi[êe]ncia profissional",
            r"(empresas?|cargos?) (em que|onde|que ele)",
            r"where (did|does) (he|you) work",
            r"work(ed)? experience",
            r"previous (jobs?|roles?|employers?)",
        ],
    ),
    (
        Section::Projects,
        &[
            r"(quais|que) projetos",
            r"projetos? (que ele|desenvolvid|pessoa)",
            r"what projects",
            r"projects? (has|did) (he|you)",
            r"(built|developed|created) (any|some) (apps?|projects?|systems?)",
        ],
    ),
    (
        Section::Skills,
        &[
            r"(quais|que) (tecnologias|linguagens de programa[çc][ãa]o|ferramentas)",
            r"sabe programar",
            r"tech(nology)? stack",
            r"stack (tecnol[óo]gic|preferid)",
            r"(what|which) (technologies|programming languages|tools)",
        ],
    ),
    (
        Section::Certifications,
        &[
            r"(quais|que) certifica[çc]",
            r"possui (alguma )?certifica",
            r"(any|what) certifications?",
            r"certified (in|on)",
        ],
    ),
    (
        Section::SoftSkills,
        &[
            r"trabalh(a|ar) em equipe",
            r"como (ele )?lida com",
            r"how does (he|she) (deal|handle)",
            r"soft skills?",
            r"habilidades (interpessoais|comportamentais)",
            r"communication skills",
        ],
    ),
    (
        Section::Languages,
        &[
            r"(quais|que) idiomas",
            r"fala (ingl[êe]s|espanhol|franc[êe]s)",
            r"(what|which) languages (does|do) (he|you) speak",
            r"speaks? (english|spanish|portuguese)",
        ],
    ),
    (
        Section::IntelligentResponses,
        &[
            r"por que (devo|deveria|dever[íi]amos) contrat",
            r"why should (i|we) hire",
            r"pontos? fortes",
            r"greatest strengths?",
        ],
    ),
];

/// Whole-word keywords, used only when no context pattern matched.
pub const KEYWORDS: &[(Section, &[&str])] = &[
    (
        Section::AcademicBackground,
        &[
            "formação", "faculdade", "universidade", "graduação", "graduado", "curso",
            "diploma", "mestrado", "doutorado", "bacharelado", "engenharia", "estudou",
            "education", "degree", "university", "college", "bachelor", "master", "phd",
        ],
    ),
    (
        Section::ProfessionalExperience,
        &[
            "experiência", "trabalho", "trabalhou", "empresa", "empresas", "emprego",
            "cargo", "carreira", "estágio", "experience", "job", "jobs", "career",
            "company", "employer", "internship", "worked",
        ],
    ),
    (
        Section::Projects,
        &[
            "projeto", "projetos", "portfólio", "portfolio", "github", "aplicativo",
            "project", "projects", "app", "apps",
        ],
    ),
    (
        Section::Skills,
        &[
            "habilidades", "tecnologias", "tecnologia", "linguagens", "linguagem",
            "ferramentas", "stack", "python", "javascript", "typescript", "react", "node",
            "java", "sql", "docker", "git", "rust", "skills", "technologies",
            "programming", "framework", "frameworks",
        ],
    ),
    (
        Section::Certifications,
        &[
            "certificação", "certificações", "certificado", "certificados",
            "certification", "certifications", "certificate", "certified", "aws",
        ],
    ),
    (
        Section::SoftSkills,
        &[
            "comunicação", "liderança", "equipe", "colaboração", "proatividade",
            "comportamento", "communication", "leadership", "teamwork", "collaboration",
        ],
    ),
    (
        Section::Languages,
        &["idiomas", "idioma", "inglês", "espanhol", "english", "spanish", "fluente", "fluent"],
    ),
    (
        Section::IntelligentResponses,
        &[
            "contratar", "contratá-lo", "diferencial", "motivação", "objetivo", "objetivos",
            "hire", "hiring", "motivation", "goals",
        ],
    ),
];

/// Fallback priority for roles without a configured list.
pub const DEFAULT_PRIORITY: &[Section] = &[
    Section::ProfessionalExperience,
    Section::Skills,
    Section::Projects,
];
