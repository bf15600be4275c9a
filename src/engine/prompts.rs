//! Prompt construction for each deliberation role, per task family.

use crate::engine::extract::{AnswerKind, TaskSpec};

/// Builds role-specific prompts for one task family. The wording pins the
/// `Answer:` / `Decision:` labels the extractor looks for.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    task: TaskSpec,
}

impl PromptBuilder {
    pub fn new(task: TaskSpec) -> Self {
        Self { task }
    }

    pub fn task(&self) -> &TaskSpec {
        &self.task
    }

    fn answer_format(&self) -> &'static str {
        match self.task.answer {
            AnswerKind::Numeric => {
                "Thoughts: [your step-by-step computation process with intermediate results]\n\
                 Answer: [the final numerical answer]\n\n\
                 Your final answer must be a single numerical number at the end of the response.\n\n"
            }
            AnswerKind::Letter => {
                "Thoughts: [your step-by-step reasoning over the options]\n\
                 Answer: [a single letter among A, B, C, or D]\n\n\
                 Your final answer must be a single option letter at the end of the response.\n\n"
            }
        }
    }

    fn problem_kind(&self) -> &'static str {
        match self.task.answer {
            AnswerKind::Numeric => "math problem",
            AnswerKind::Letter => "multiple-choice question",
        }
    }

    pub fn author_prompt(&self, question: &str) -> String {
        format!(
            "You are an expert assistant. Please help to solve the following {}:\n\
             {}\n\n\
             Give your thoughts and the final answer in the following format:\n{}",
            self.problem_kind(),
            question,
            self.answer_format(),
        )
    }

    pub fn reviewer_prompt(&self, question: &str, author_response: &str) -> String {
        format!(
            "You are a reviewer. The author has submitted the following answer to a {}:\n\n\
             Question: {}\n\n\
             Answer: {}\n\n\
             Please evaluate the correctness of the author's response. Follow the instructions and format strictly:\n\n\
             ---\n\n\
             Your output format must be:\n\n\
             Decision: [right | wrong]  \n\
             Confidence: [1-5] (5 = highest confidence)  \n\
             Justification: [reasons or author mistakes supporting your decision] \n\
             ---\n\n",
            self.problem_kind(),
            question,
            author_response,
        )
    }

    pub fn meta_prompt(&self, question: &str, author_response: &str, combined_reviews: &str) -> String {
        format!(
            "You are the meta-reviewer. The author has submitted an answer to a {}.\n\n\
             Question: {}\n\n\
             Answer: {}\n\n\
             You must decide whether the answer is correct by summarizing and analyzing the reviewers' comments below:\n\n\
             --- Reviewer Feedback ---\n\
             {}\n\n\
             Provide your conclusion in the following format. If the decision is 'wrong', you must identify the flawed step(s) and give your suggestions for revision.\n\n\
             Decision: [right | wrong]\n\
             Justification: [reasons for your decision]\n\
             Suggestions: [your suggestions for updating the answer]\n",
            self.problem_kind(),
            question,
            author_response,
            combined_reviews,
        )
    }

    pub fn feedback_prompt(&self, question: &str, author_response: &str, meta_review: &str) -> String {
        format!(
            "Your answer to the following question was reviewed and marked as incorrect by the meta-reviewer.\n\n\
             Question: {}\n\n\
             Your original answer: {}\n\n\
             The meta-reviewer has provided the following feedback:\n\n\
             {}\n\n\
             You must consider the meta-reviewer's suggestions seriously and revise your answer accordingly.\n\n\
             Make sure to state your thoughts and new answer with this format:\n{}",
            question,
            author_response,
            meta_review,
            self.answer_format(),
        )
    }

    pub fn initial_prompt(&self, question: &str) -> String {
        self.author_prompt(question)
    }

    pub fn reflection_prompt(&self, question: &str, response: &str) -> String {
        format!(
            "You wrote the following response to a {}:\n\n\
             Question: {}\n\n\
             Answer: {}\n\n\
             Carefully review your own answer. Are there any mistakes, inconsistencies, or reasoning errors?\n\
             If yes, explain the problems and revise your answer accordingly. If not, confirm and repeat your initial answer.\n\
             Your final response must follow this format:\n\
             Mistakes (if any): \n\n{}",
            self.problem_kind(),
            question,
            response,
            self.answer_format(),
        )
    }

    /// Debate prompt for one round. With no peer solutions this is the
    /// independent opening prompt; otherwise each peer's argument is
    /// quoted and the agent is asked to reconsider.
    pub fn debate_prompt(&self, question: &str, other_responses: &[&str]) -> String {
        if other_responses.is_empty() {
            return self.author_prompt(question);
        }

        let mut prompt = String::from("These are the solutions to the problem from other agents:\n");
        for response in other_responses {
            prompt.push_str(&format!("\n\nOne agent solution: ```{response}```"));
        }
        prompt.push_str(&format!(
            "\n\nUsing the solutions from other agents as additional information, \
             can you provide your final answer to the {}?\n\
             Make sure to state your thoughts and new answer with this format:\n{}",
            self.problem_kind(),
            self.answer_format(),
        ));
        prompt
    }
}
