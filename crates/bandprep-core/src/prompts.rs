//! Prompt text sent to the completion service.

use indoc::{formatdoc, indoc};

use crate::task::TaskKind;

const LETTER_GENERATION: &str = indoc! {"
    Generate an authentic and varied IELTS General Training Writing Task 1 (Letter Writing) prompt.
    Ensure the generated task is unique and covers a wide range of possible scenarios and tones that are used in IELTS General Writing Test Task 1.
    Specifically, randomize the following aspects:
    - The situation: It could be about accommodation, work, a social event, a complaint, a request for information, etc.
    - The required tone: Randomly choose between formal (e.g., writing to a company manager), semi-formal (e.g., writing to a landlord), or informal (e.g., writing to a friend).
    The prompt must include a clear situation and three bullet points specifying what the letter should cover.
    Format it exactly as it would appear in an actual IELTS exam.
    Only return the task prompt, nothing else. Do not use markdown formatting."};

const ESSAY_GENERATION: &str = indoc! {"
    Generate an authentic and varied IELTS General Training Writing Task 2 (Essay Writing) prompt.
    Ensure the generated task is unique and covers a wide range of possible topics and question formats.
    Specifically, randomize the following aspects:
    - The topic: Choose from a diverse range of subjects like technology, environment, education, work-life balance, globalization, health, or social issues.
    - The question type: Randomly select one of the common IELTS formats, such as 'Agree or Disagree', 'Discuss both views and give your opinion', 'Advantages and Disadvantages', 'Problem and Solution', or a 'Two-part question'.
    The prompt should present a clear statement or question for the test-taker to respond to.
    Format it exactly as it would appear in an actual IELTS exam.
    Only return the task prompt, nothing else."};

pub fn generation_prompt(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::ShortTask => LETTER_GENERATION,
        TaskKind::LongTask => ESSAY_GENERATION,
    }
}

/// Evaluation request for one response. `word_count` is embedded verbatim and
/// the model is told not to recount.
pub fn evaluation_prompt(kind: TaskKind, task: &str, response: &str, word_count: usize) -> String {
    formatdoc! {r#"
        You are an IELTS examiner. Evaluate the following IELTS General Training Writing {label} response.

        The user's response contains exactly {word_count} words. Please use this number for your evaluation and do not calculate it yourself.

        TASK:
        {task}

        RESPONSE:
        {response}

        Provide a detailed evaluation in the following JSON format:
        {{
            "bandScore": (number 0-9 with 0.5 increments),
            "taskAchievement": "(detailed feedback on how well the task requirements were met)",
            "coherenceCohesion": "(feedback on organization, paragraphing, and logical flow)",
            "lexicalResource": "(feedback on vocabulary range, accuracy, and appropriateness)",
            "grammaticalRange": "(feedback on grammar variety and accuracy)",
            "errors": [
                {{"error": "specific mistake", "explanation": "why it's wrong", "correction": "how to fix it"}}
            ],
            "improvements": ["suggestion 1", "suggestion 2", "suggestion 3"],
            "correctedVersion": "(a corrected and improved version of the response)"
        }}

        Only return valid JSON, nothing else."#,
        label = kind.label(),
        word_count = word_count,
        task = task,
        response = response,
    }
}
