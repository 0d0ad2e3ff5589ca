use crashmon::analysis::{bar_chart, common_tokens, pairs_within};
use crashmon::distribution::Distribution;

fn dist(text: &str) -> Distribution {
    Distribution::of_command(text)
}

#[test]
fn common_tokens_sum_across_commands_lightest_first() {
    let tokens = common_tokens(&[dist("ls tmp"), dist("ls ls home")]);
    let names: Vec<&str> = tokens.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(names, vec!["home", "tmp", "ls"]);
    let ls = tokens.iter().find(|(t, _)| t == "ls").unwrap().1;
    assert!((ls - (0.5 + 2.0 / 3.0)).abs() < 1e-12);
}

#[test]
fn pairs_within_skips_empty_commands_and_respects_bounds() {
    let dists = [
        dist("python run.py --job 1"),
        dist(""),
        dist("python run.py --job 2"),
        dist("make all"),
    ];
    let pairs = pairs_within(&dists, 0.0, 1.0);
    assert_eq!(pairs.len(), 1);
    assert_eq!((pairs[0].0, pairs[0].1), (0, 2));
    assert!((pairs[0].2 - 0.4).abs() < 1e-12);
    assert!(pairs_within(&dists, 0.5, 1.0).is_empty());
}

#[test]
fn bar_chart_scales_to_heaviest_token() {
    let chart = bar_chart(&dist("aa aa aa b"), 13);
    let lines: Vec<&str> = chart.lines().collect();
    assert_eq!(lines, vec!["aa ##########", "b  ###"]);
    assert_eq!(bar_chart(&Distribution::default(), 80), "");
}
