use diesel::pg::PgConnection;
use diesel::prelude::*;
use dotenv::dotenv;
use exitfailure::ExitFailure;
use failure::ResultExt;
use quizbank::actions;
use quizbank::models::*;
use structopt::StructOpt;

#[derive(StructOpt)]
enum Command {
    /// Create the questions table if needed and insert the sample set
    Seed,
    /// Print all questions
    List {
        #[structopt(short, long)]
        difficulty: Option<Difficulty>,
    },
    /// Hard-delete a question
    Delete { id: i32 },
    /// Clear used_at for one question, or for every question
    ResetUsed {
        #[structopt(long)]
        id: Option<i32>,
    },
}

#[derive(StructOpt)]
struct Args {
    #[structopt(short, long, env = "DATABASE_URL")]
    database_url: String,
    #[structopt(subcommand)]
    command: Command,
}

fn main() -> Result<(), ExitFailure> {
    let _ = dotenv();
    let args = Args::from_args();
    let db = PgConnection::establish(&args.database_url).context("unable to connect database")?;
    match args.command {
        Command::Seed => seed(db)?,
        Command::List { difficulty } => list(db, difficulty)?,
        Command::Delete { id } => delete(db, id)?,
        Command::ResetUsed { id } => reset_used(db, id)?,
    }
    Ok(())
}

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS questions (
    id SERIAL PRIMARY KEY,
    text TEXT NOT NULL,
    difficulty VARCHAR(20) NOT NULL DEFAULT 'facil',
    type VARCHAR(30) NOT NULL DEFAULT 'discursiva',
    answer TEXT NOT NULL DEFAULT '',
    options TEXT[],
    correct_index INTEGER,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    used_at TIMESTAMPTZ
)
"#;

fn sample_questions() -> Vec<QuestionInput> {
    vec![
        QuestionInput {
            text: "Qual é a capital do Brasil?".into(),
            difficulty: Some(Difficulty::Facil),
            type_: Some(QuestionType::Mcq),
            answer: Some("Brasília".into()),
            options: Some(vec![
                "Rio de Janeiro".into(),
                "Brasília".into(),
                "São Paulo".into(),
                "Salvador".into(),
            ]),
            correct_index: Some(1),
        },
        QuestionInput {
            text: "Quanto é 7 × 8?".into(),
            difficulty: Some(Difficulty::Medio),
            type_: Some(QuestionType::Mcq),
            answer: Some("56".into()),
            options: Some(vec!["54".into(), "56".into(), "58".into(), "64".into()]),
            correct_index: Some(1),
        },
        QuestionInput {
            text: "Explique o que é HTML.".into(),
            difficulty: Some(Difficulty::Medio),
            type_: Some(QuestionType::Open),
            answer: Some(
                "HTML é uma linguagem de marcação usada para estruturar conteúdo na web.".into(),
            ),
            options: None,
            correct_index: None,
        },
    ]
}

fn seed(db: PgConnection) -> Result<(), failure::Error> {
    diesel::sql_query(CREATE_TABLE)
        .execute(&db)
        .context("unable to create questions table")?;
    for input in sample_questions() {
        let data = input.validate()?;
        let row = actions::create_question(&db, &data)?;
        println!("inserted question {} ({})", row.id, row.text);
    }
    Ok(())
}

fn list(db: PgConnection, difficulty: Option<Difficulty>) -> Result<(), failure::Error> {
    let mut page = 1;
    loop {
        let listing = actions::list_questions(&db, page, 50, difficulty)?;
        if listing.rows.is_empty() {
            break;
        }
        for row in listing.rows {
            let used = if row.used_at.is_some() {
                "used"
            } else {
                "unused"
            };
            println!(
                "{} [{}] [{}/{}] {}",
                row.id,
                used,
                QuestionType::from_db_label(&row.type_),
                row.difficulty,
                row.text
            );
        }
        page += 1;
    }
    Ok(())
}

fn delete(db: PgConnection, id: i32) -> Result<(), failure::Error> {
    if actions::delete_question(&db, id)? {
        println!("deleted question {}", id);
    } else {
        println!("question {} not found", id);
    }
    Ok(())
}

fn reset_used(db: PgConnection, id: Option<i32>) -> Result<(), failure::Error> {
    let n = actions::reset_used(&db, id)?;
    println!("reset used_at on {} question(s)", n);
    Ok(())
}
