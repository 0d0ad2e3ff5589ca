use crashmon::cluster::{ClusterIndex, MatchPolicy, RepresentativeId, DEFAULT_THRESHOLD};
use crashmon::distribution::Distribution;

#[test]
fn first_command_creates_and_similar_command_joins() {
    let mut index: ClusterIndex<&str> = ClusterIndex::new();
    assert_eq!(index.threshold(), DEFAULT_THRESHOLD);

    let a = index.insert("python run.py --job 123", "crash-1");
    assert!(a.is_new);
    assert!(a.attached);
    assert_eq!(a.representative.id(), RepresentativeId(0));

    let b = index.insert("python run.py --job 456", "crash-2");
    assert!(!b.is_new);
    let rep = b.representative;
    assert_eq!(rep.id(), RepresentativeId(0));
    assert_eq!(rep.text(), "python run.py --job 123");
    assert_eq!(rep.distribution(), &Distribution::of_command("python run.py --job 123"));
    assert_eq!(rep.associations(), &["crash-1", "crash-2"]);
    assert_eq!(index.len(), 1);
}

#[test]
fn dissimilar_command_starts_a_new_cluster() {
    let mut index = ClusterIndex::new();
    index.insert("python run.py --job 1", 1u32);
    let other = index.insert("make -j8 install", 2u32);
    assert!(other.is_new);
    assert_eq!(other.representative.id(), RepresentativeId(1));
    assert_eq!(index.len(), 2);
}

#[test]
fn attaching_the_same_handle_twice_keeps_one_copy() {
    let mut index = ClusterIndex::new();
    index.insert("ls -l /tmp", "h");
    let again = index.insert("ls -l /tmp", "h");
    assert!(!again.is_new);
    assert!(!again.attached);
    assert_eq!(again.representative.associations(), &["h"]);
}

#[test]
fn commands_without_tokens_all_share_one_cluster() {
    let mut index = ClusterIndex::new();
    assert!(index.insert("# nothing here", 1).is_new);
    let second = index.insert("", 2);
    assert!(!second.is_new);
    assert_eq!(second.representative.associations(), &[1, 2]);
}

fn three_clusters(policy: MatchPolicy) -> ClusterIndex<&'static str> {
    let mut index = ClusterIndex::new().with_policy(policy);
    assert!(index.insert("a b c d", "r1").is_new);
    assert!(index.insert("x y z w", "r2").is_new);
    assert!(index.insert("a b c e f g", "r3").is_new);
    index
}

#[test]
fn last_qualifying_representative_wins_over_closer_one() {
    let mut index = three_clusters(MatchPolicy::LastQualifying);
    let query = Distribution::of_command("a b c d e");
    let close = crashmon::distribution::distance(index.representatives()[0].distribution(), &query);
    let far = crashmon::distribution::distance(index.representatives()[2].distribution(), &query);
    assert!(close < far && far < DEFAULT_THRESHOLD);

    let hit = index.insert("a b c d e", "r4");
    assert!(!hit.is_new);
    assert_eq!(hit.representative.id(), RepresentativeId(2));
    assert_eq!(index.representatives()[0].associations(), &["r1"]);
}

#[test]
fn nearest_policy_picks_the_closest_representative() {
    let mut index = three_clusters(MatchPolicy::Nearest);
    let hit = index.insert("a b c d e", "r4");
    assert_eq!(hit.representative.id(), RepresentativeId(0));
}

fn two_equidistant_clusters(policy: MatchPolicy) -> ClusterIndex<&'static str> {
    let mut index = ClusterIndex::with_threshold(0.1).with_policy(policy);
    assert!(index.insert("a b c d", "r1").is_new);
    assert!(index.insert("a b c e", "r2").is_new);
    index
}

#[test]
fn nearest_policy_tie_keeps_the_earliest_representative() {
    let mut index = two_equidistant_clusters(MatchPolicy::Nearest);
    let query = Distribution::of_command("a b c");
    let reps = index.representatives();
    let first = crashmon::distribution::distance(reps[0].distribution(), &query);
    let second = crashmon::distribution::distance(reps[1].distribution(), &query);
    assert_eq!(first, second);
    assert!(first < DEFAULT_THRESHOLD);

    let hit = index.insert_with_threshold("a b c", "r3", DEFAULT_THRESHOLD);
    assert!(!hit.is_new);
    assert_eq!(hit.representative.id(), RepresentativeId(0));
}

#[test]
fn last_qualifying_tie_takes_the_later_representative() {
    let mut index = two_equidistant_clusters(MatchPolicy::LastQualifying);
    let hit = index.insert_with_threshold("a b c", "r3", DEFAULT_THRESHOLD);
    assert_eq!(hit.representative.id(), RepresentativeId(1));
}

#[test]
fn threshold_is_strict() {
    let mut index = ClusterIndex::with_threshold(0.4);
    index.insert("python run.py --job 1", 1);
    // distance is exactly 0.4, which does not qualify
    assert!(index.insert("python run.py --job 2", 2).is_new);
    assert!(!index.insert_with_threshold("python run.py --job 3", 3, 0.5).is_new);
}

#[test]
fn find_match_does_not_mutate() {
    let mut index = ClusterIndex::new();
    index.insert("rsync -a src dst", ());
    let d = Distribution::of_command("rsync -a src dst2");
    assert_eq!(index.find_match(&d, 0.7), Some(RepresentativeId(0)));
    assert_eq!(index.find_match(&d, 0.1), None);
    assert_eq!(index.len(), 1);
}

#[test]
fn display_text_restores_line_breaks() {
    let mut index = ClusterIndex::new();
    let rep = index.insert("cd /w;./run.sh", 0).representative;
    assert_eq!(rep.display_text(), "cd /w\n./run.sh");
    assert_eq!(rep.short_text(300), "cd /w;./run.sh");
}
