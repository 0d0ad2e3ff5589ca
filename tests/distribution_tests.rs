use crashmon::distribution::{distance, Distribution};

fn dist(text: &str) -> Distribution {
    Distribution::of_command(text)
}

#[test]
fn proportions_sum_to_one_and_count_repeats() {
    let d = Distribution::build(&["a", "b", "a", "c"]);
    assert_eq!(d.len(), 3);
    assert_eq!(d.get("a"), Some(0.5));
    assert_eq!(d.get("b"), Some(0.25));
    assert!((d.total() - 1.0).abs() < 1e-12);

    let d = dist("python run.py --year 1999 --year 2000 --out /tmp/x.nc");
    assert!((d.total() - 1.0).abs() < 1e-12);
}

#[test]
fn empty_tokens_give_empty_distribution() {
    let empty: [&str; 0] = [];
    let d = Distribution::build(&empty);
    assert!(d.is_empty());
    assert_eq!(d.total(), 0.0);
    assert!(dist("# just a comment;  ").is_empty());
}

#[test]
fn distance_to_self_is_zero() {
    for text in ["ls -l", "a a b", "", "cd /x;./run ${JOB} 12"] {
        let d = dist(text);
        assert_eq!(distance(&d, &d), 0.0);
    }
}

#[test]
fn distance_is_symmetric_and_bounded() {
    let samples = [
        dist("python run.py --job 1"),
        dist("python run.py --job 2"),
        dist("make all"),
        dist(""),
        dist("a a a b"),
        dist("b c d e f g h"),
    ];
    for x in &samples {
        for y in &samples {
            let d = distance(x, y);
            assert_eq!(d, distance(y, x));
            assert!((0.0..=2.0 + 1e-12).contains(&d), "distance {d} out of range");
        }
    }
}

#[test]
fn disjoint_distributions_are_two_apart_and_empties_are_identical() {
    assert!((distance(&dist("a b"), &dist("c d")) - 2.0).abs() < 1e-12);
    assert_eq!(distance(&dist(""), &dist("#x")), 0.0);
    // empty vs non-empty: the whole mass of the other side
    assert!((distance(&dist(""), &dist("a b")) - 1.0).abs() < 1e-12);
}

#[test]
fn one_volatile_token_in_five_costs_point_four() {
    let d = distance(&dist("python run.py --job 123"), &dist("python run.py --job 456"));
    assert!((d - 0.4).abs() < 1e-12);
}

#[test]
fn serializes_as_flat_token_map() {
    let d = Distribution::from_json(r#"{"ls":0.5,"tmp":0.5}"#).unwrap();
    assert_eq!(d.get("ls"), Some(0.5));
    assert_eq!(d, dist("ls /tmp"));
    let json: serde_json::Value = serde_json::from_str(&d.to_json().unwrap()).unwrap();
    assert_eq!(json, serde_json::json!({"ls": 0.5, "tmp": 0.5}));
}
