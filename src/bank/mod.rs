use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::from_str;

use crate::error::BankError;

static BANK_DIR: Dir = include_dir!("src/bank");

/// Category of test. Decides which bank questions come from and how many
/// options each question carries.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum TestType {
    Aptitude,
    Reasoning,
    Verbal,
    Quantitative,
}

impl TestType {
    /// Every question of this type has exactly this many options.
    pub fn options_per_question(&self) -> usize {
        match self {
            TestType::Aptitude | TestType::Reasoning | TestType::Verbal | TestType::Quantitative => 4,
        }
    }

    fn bank_file(&self) -> String {
        format!("{}.json", self.to_string().to_lowercase())
    }
}

/// What the test-selection flow hands over when a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDescriptor {
    pub id: String,
    pub title: String,
    pub test_type: TestType,
    pub questions: usize,
    pub duration_minutes: u64,
}

impl TestDescriptor {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        test_type: TestType,
        questions: usize,
        duration_minutes: u64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            test_type,
            questions,
            duration_minutes,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.duration_minutes.saturating_mul(60)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    /// 1-based position in the test
    pub ordinal: usize,
    pub prompt: String,
    pub options: Vec<String>,
}

#[derive(Deserialize, Clone, Debug)]
struct BankFile {
    name: String,
    questions: Vec<Template>,
}

#[derive(Deserialize, Clone, Debug)]
struct Template {
    prompt: String,
    options: Vec<String>,
}

/// Source of questions for a test descriptor.
pub trait QuestionBank {
    fn load(&self, descriptor: &TestDescriptor) -> Result<Vec<Question>, BankError>;
}

/// Banks compiled into the binary, one JSON file per [`TestType`].
///
/// Templates are shuffled and, when a test asks for more questions than a
/// bank holds, reused as numbered variants.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedBank {
    seed: Option<u64>,
}

impl EmbeddedBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic question order for tests and reproducible sessions.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl QuestionBank for EmbeddedBank {
    fn load(&self, descriptor: &TestDescriptor) -> Result<Vec<Question>, BankError> {
        let bank = read_bank(&descriptor.test_type.bank_file())?;
        let expected = descriptor.test_type.options_per_question();
        let templates: Vec<&Template> = bank
            .questions
            .iter()
            .filter(|t| t.options.len() == expected && t.options.iter().all(|o| !o.is_empty()))
            .collect();
        if templates.is_empty() {
            return Err(BankError::Empty { name: bank.name });
        }

        let mut order: Vec<usize> = (0..templates.len()).collect();
        order.shuffle(&mut self.rng());

        let questions = (0..descriptor.questions)
            .map(|i| {
                let template = templates[order[i % order.len()]];
                let round = i / order.len();
                let prompt = if round == 0 {
                    template.prompt.clone()
                } else {
                    format!("{} (variant {})", template.prompt, round + 1)
                };
                Question {
                    id: format!("{}-q{}", descriptor.id, i + 1),
                    ordinal: i + 1,
                    prompt,
                    options: template.options.clone(),
                }
            })
            .collect();

        Ok(questions)
    }
}

fn read_bank(file_name: &str) -> Result<BankFile, BankError> {
    let contents = BANK_DIR
        .get_file(file_name)
        .and_then(|f| f.contents_utf8())
        .ok_or_else(|| BankError::UnknownBank {
            name: file_name.to_string(),
        })?;

    from_str(contents).map_err(|source| BankError::Parse {
        name: file_name.to_string(),
        source,
    })
}

/// Built-in tests offered when no stored descriptor is resumed.
pub fn catalog() -> Vec<TestDescriptor> {
    vec![
        TestDescriptor::new("apt-101", "Aptitude Practice Test 1", TestType::Aptitude, 20, 30),
        TestDescriptor::new("rsn-101", "Logical Reasoning Drill", TestType::Reasoning, 15, 20),
        TestDescriptor::new("vrb-101", "Verbal Ability Mock", TestType::Verbal, 10, 15),
        TestDescriptor::new("qnt-101", "Quantitative Aptitude Mock", TestType::Quantitative, 25, 45),
    ]
}

/// First catalog entry of the given type.
pub fn catalog_entry(test_type: TestType) -> Option<TestDescriptor> {
    catalog().into_iter().find(|d| d.test_type == test_type)
}
