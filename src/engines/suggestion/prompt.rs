use crate::config::SuggestionConfig;
use crate::engines::generation::chromosome::Chromosome;
use crate::engines::generation::goals::Goal;
use crate::engines::suggestion::pipeline::UnitUnderTest;

/// Longest prefix of `text` with at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

fn rules(unit: &UnitUnderTest, config: &SuggestionConfig) -> String {
    let class_name = config
        .artifact_name
        .split('.')
        .next()
        .unwrap_or(&config.artifact_name);
    format!(
        "- The tests must be self-contained; do not rely on setup methods.\n\
         - Name the test class '{}'.\n\
         - Use only public and protected members of the class under test.\n\
         - Do not use mocking frameworks.\n\
         - Import what is needed from the classpath {} including the class under test {}.\n\
         - The result must compile as-is.\n",
        class_name, unit.classpath, unit.name
    )
}

/// Prompt asking for tests that reach the given uncovered goals
pub fn goal_prompt(unit: &UnitUnderTest, goals: &[Goal], config: &SuggestionConfig) -> String {
    let goal_list = goals
        .iter()
        .map(|g| g.label.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Given the class under test (it may be cut off) and the goals it has not met yet, \
         write stand-alone unit tests that cover these goals.\n{}\
         \nClass under test:\n```\n{}\n```\nGoals to cover:\n{}",
        rules(unit, config),
        truncate_chars(&unit.source, config.max_source_chars),
        truncate_chars(&goal_list, config.max_goal_chars)
    )
}

/// Prompt asking for `count` tests that seed the initial population
pub fn seed_prompt(unit: &UnitUnderTest, count: usize, config: &SuggestionConfig) -> String {
    format!(
        "Given the class under test (it may be cut off) and the coverage criteria, \
         write {} stand-alone unit tests that satisfy as much of the criteria as possible.\n{}\
         \nClass under test:\n```\n{}\n```\nCriteria:\n{}",
        count,
        rules(unit, config),
        truncate_chars(&unit.source, config.max_source_chars),
        config.criteria.join(", ")
    )
}

/// Prompt asking where two chromosomes should be cut for crossover
pub fn crossover_prompt(first: &Chromosome, second: &Chromosome) -> String {
    format!(
        "For these two tests, return the most suitable positions to perform a single-point \
         crossover.\n\
         - Answer with an array [x1, x2], x1 being the position in test 1 and x2 the position in test 2.\n\
         - Do not pick the last line.\n\
         - Answer with the array only, without formatting or explanation.\n\
         \nTest 1: ```\n{}\n```\n\
         \nTest 2: ```\n{}\n```\n",
        first, second
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(source: &str) -> UnitUnderTest {
        UnitUnderTest::new("com.example.Stack", source, "/tmp/classes")
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_goal_prompt_truncates_source_and_goals() {
        let config = SuggestionConfig {
            max_source_chars: 5,
            max_goal_chars: 8,
            ..Default::default()
        };
        let goals = vec![Goal::new(0, "line 12"), Goal::new(1, "line 40")];
        let prompt = goal_prompt(&unit("0123456789"), &goals, &config);

        assert!(prompt.contains("```\n01234\n```"));
        assert!(!prompt.contains("0123456"));
        assert!(prompt.ends_with("line 12\n"));
        assert!(prompt.contains("com.example.Stack"));
    }

    #[test]
    fn test_seed_prompt_carries_count_and_criteria() {
        let config = SuggestionConfig::default();
        let prompt = seed_prompt(&unit("class Stack {}"), 7, &config);
        assert!(prompt.contains("write 7 stand-alone"));
        assert!(prompt.contains("LINE, BRANCH"));
        assert!(prompt.contains("'ClassTest'"));
    }
}
