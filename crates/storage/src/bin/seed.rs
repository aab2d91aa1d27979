use std::fmt;

use exam_core::model::{OptionLetter, OptionSet, QuestionDraft};
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("EXAM_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  EXAM_DB_URL");
}

struct Sample {
    subject: &'static str,
    difficulty: &'static str,
    prompt: &'static str,
    options: [&'static str; 4],
    correct: OptionLetter,
    rationale: &'static str,
    issuer: &'static str,
}

fn samples() -> Vec<Sample> {
    vec![
        Sample {
            subject: "Língua Portuguesa",
            difficulty: "Fácil",
            prompt: "Assinale a alternativa em que todas as palavras estão grafadas corretamente.",
            options: ["exceção, privilégio, jeito", "excessão, privilégio, jeito", "exceção, previlégio, geito", "excessão, previlégio, jeito"],
            correct: OptionLetter::A,
            rationale: "As formas corretas são exceção, privilégio e jeito.",
            issuer: "CESGRANRIO",
        },
        Sample {
            subject: "Língua Portuguesa",
            difficulty: "Médio",
            prompt: "Na frase \"Entregaram-me o relatório ontem\", o pronome \"me\" exerce a função de:",
            options: ["objeto direto", "objeto indireto", "sujeito", "adjunto adnominal"],
            correct: OptionLetter::B,
            rationale: "Quem entrega, entrega algo a alguém; \"me\" é o destinatário.",
            issuer: "FGV",
        },
        Sample {
            subject: "Matemática",
            difficulty: "Fácil",
            prompt: "Qual é o valor de 15% de 200?",
            options: ["20", "25", "30", "35"],
            correct: OptionLetter::C,
            rationale: "15% de 200 = 0,15 × 200 = 30.",
            issuer: "CESGRANRIO",
        },
        Sample {
            subject: "Raciocínio Lógico",
            difficulty: "Médio",
            prompt: "Se todo A é B e algum B é C, então:",
            options: ["todo A é C", "algum A é C", "nenhum A é C", "nada se pode concluir sobre A e C"],
            correct: OptionLetter::D,
            rationale: "As premissas não conectam A e C de forma necessária.",
            issuer: "CESPE",
        },
        Sample {
            subject: "Direito Administrativo",
            difficulty: "Médio",
            prompt: "São princípios expressos da Administração Pública, previstos no art. 37 da Constituição Federal:",
            options: ["legalidade, impessoalidade, moralidade, publicidade e eficiência", "legalidade, razoabilidade, moralidade, publicidade e eficiência", "legalidade, impessoalidade, motivação, publicidade e eficiência", "supremacia, impessoalidade, moralidade, publicidade e eficiência"],
            correct: OptionLetter::A,
            rationale: "O caput do art. 37 lista os cinco princípios conhecidos pela sigla LIMPE.",
            issuer: "CESPE",
        },
        Sample {
            subject: "Conhecimentos Bancários",
            difficulty: "Fácil",
            prompt: "O órgão responsável por formular as diretrizes da política monetária nacional é:",
            options: ["a Caixa Econômica Federal", "o Conselho Monetário Nacional", "a Febraban", "a Casa da Moeda"],
            correct: OptionLetter::B,
            rationale: "O CMN é o órgão normativo máximo do Sistema Financeiro Nacional.",
            issuer: "CESGRANRIO",
        },
        Sample {
            subject: "Informática",
            difficulty: "Fácil",
            prompt: "No contexto de segurança da informação, phishing é:",
            options: ["um tipo de firewall", "uma técnica de backup incremental", "uma fraude que induz o usuário a fornecer dados pessoais", "um protocolo de criptografia"],
            correct: OptionLetter::C,
            rationale: "Phishing usa mensagens falsas para capturar credenciais e dados pessoais.",
            issuer: "FGV",
        },
        Sample {
            subject: "Atualidades",
            difficulty: "Médio",
            prompt: "O acordo internacional que estabelece metas de redução de emissões de gases de efeito estufa, firmado em 2015, é conhecido como:",
            options: ["Protocolo de Kyoto", "Acordo de Paris", "Agenda 2030", "Tratado de Roma"],
            correct: OptionLetter::B,
            rationale: "O Acordo de Paris foi adotado na COP21, em 2015.",
            issuer: "FGV",
        },
    ]
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;

    let samples = samples();
    let mut inserted = 0_usize;
    for sample in &samples {
        let letters = [
            OptionLetter::A,
            OptionLetter::B,
            OptionLetter::C,
            OptionLetter::D,
        ];
        let options = OptionSet::new(
            letters
                .iter()
                .zip(sample.options.iter())
                .map(|(letter, text)| (*letter, (*text).to_string())),
        )?;

        let draft = QuestionDraft {
            subject: sample.subject.to_string(),
            difficulty: Some(sample.difficulty.to_string()),
            prompt: sample.prompt.to_string(),
            options,
            correct: sample.correct,
            rationale: Some(sample.rationale.to_string()),
            hint: None,
            formula: None,
            issuer: Some(sample.issuer.to_string()),
        };

        storage.questions.insert_question(&draft.validate()?).await?;
        inserted += 1;
    }

    println!("Seeded {inserted} questions into {}", args.db_url);

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
