use diesel::pg::PgConnection;
use diesel::prelude::*;
use dotenv::dotenv;
use exitfailure::ExitFailure;
use failure::ResultExt;
use quizbank::actions;
use quizbank::models::{Difficulty, QuestionJson, QuestionType};
use quizbank::runner::{Guess, Session};
use std::io::stdin;
use std::time::{Duration, Instant};
use structopt::StructOpt;

#[derive(StructOpt)]
struct Args {
    #[structopt(short, long, env = "DATABASE_URL")]
    database_url: String,
    #[structopt(long)]
    difficulty: Option<Difficulty>,
    #[structopt(long)]
    question_type: Option<QuestionType>,
    /// Countdown duration in seconds
    #[structopt(long, default_value = "15")]
    timer: u64,
}

fn main() -> Result<(), ExitFailure> {
    let _ = dotenv();
    let args = Args::from_args();
    let db = PgConnection::establish(&args.database_url).context("unable to connect database")?;
    let timer = Duration::from_secs(args.timer);

    loop {
        let mut drawn = actions::draw_questions(&db, 1, args.difficulty, args.question_type)
            .context("unable to draw a question")?;
        let question = match drawn.pop() {
            Some(q) => QuestionJson::from(q),
            None => {
                println!("No more questions available (all have been used).");
                break;
            }
        };
        if !play_question(&db, question, timer)? {
            break;
        }
    }
    Ok(())
}

fn present(session: &Session) {
    let q = session.question();
    println!();
    println!("[{}/{}] {}", q.type_, q.difficulty, q.text);
    if let Some(options) = &q.options {
        for (idx, option) in options.iter().enumerate() {
            println!("  {}) {}", (b'A' + idx as u8) as char, option);
        }
    }
    match q.type_ {
        QuestionType::Open => println!("type an answer, or: start / reveal / quit"),
        QuestionType::Mcq => println!("pick 1-4, or: start / reveal / quit"),
    }
}

/// Runs one question to completion. Returns false when the player quits.
fn play_question(
    db: &PgConnection,
    question: QuestionJson,
    timer: Duration,
) -> Result<bool, failure::Error> {
    let mut session = Session::new(question, timer);
    present(&session);
    let mut last_input = Instant::now();
    loop {
        let mut input = String::new();
        stdin().read_line(&mut input)?;
        // the countdown advances with wall-clock time between prompts
        session.tick(last_input.elapsed());
        last_input = Instant::now();

        let input = input.trim();
        match input {
            "quit" => return Ok(false),
            "start" => {
                session.timer_mut().start();
                println!("timer running: {}s left", session.timer().remaining().as_secs());
                continue;
            }
            "reveal" => session.reveal(),
            guess => {
                let result = match session.question().type_ {
                    QuestionType::Mcq => match guess.parse::<usize>() {
                        Ok(n) if (1..=4).contains(&n) => session.pick_option(n - 1),
                        _ => {
                            println!("pick an option between 1 and 4");
                            continue;
                        }
                    },
                    QuestionType::Open => session.submit_answer(guess),
                };
                match result {
                    Guess::Correct => println!("Correct!"),
                    Guess::Wrong => {
                        println!("Wrong, try again");
                        continue;
                    }
                    Guess::Ignored => continue,
                }
            }
        }
        if session.should_consume() {
            println!("Answer: {}", session.correct_answer_text());
            // losing the conditional update is fine, another player got here first
            let _ = actions::mark_used(db, session.question().id)
                .context("unable to mark question as used")?;
            println!("press enter for the next question (or type quit)");
            let mut input = String::new();
            stdin().read_line(&mut input)?;
            return Ok(input.trim() != "quit");
        }
    }
}
