use engine::services::rankings::compute_rankings;
use uuid::Uuid;

#[test]
fn test_seed_average_and_tiebreaker_with_three_scores() {
    let team = Uuid::new_v4();
    let rankings = compute_rankings(&[(team, vec![150.0, 120.0, 100.0])]);

    assert_eq!(rankings.len(), 1);
    assert_eq!(rankings[0].seed_average, Some(135.0));
    assert_eq!(rankings[0].tiebreaker, Some(100.0));
    assert_eq!(rankings[0].seed_rank, Some(1));
}

#[test]
fn test_tiebreaker_is_sum_with_two_scores() {
    let team = Uuid::new_v4();
    let rankings = compute_rankings(&[(team, vec![150.0, 120.0])]);

    assert_eq!(rankings[0].seed_average, Some(135.0));
    assert_eq!(rankings[0].tiebreaker, Some(270.0));
}

#[test]
fn test_single_score_is_both_average_and_tiebreaker() {
    let team = Uuid::new_v4();
    let rankings = compute_rankings(&[(team, vec![88.5])]);

    assert_eq!(rankings[0].seed_average, Some(88.5));
    assert_eq!(rankings[0].tiebreaker, Some(88.5));
}

#[test]
fn test_input_order_does_not_matter() {
    let team = Uuid::new_v4();
    let rankings = compute_rankings(&[(team, vec![100.0, 150.0, 120.0])]);

    assert_eq!(rankings[0].seed_average, Some(135.0));
    assert_eq!(rankings[0].tiebreaker, Some(100.0));
}

#[test]
fn test_scoreless_team_is_unranked_and_null() {
    let scored = Uuid::new_v4();
    let scoreless = Uuid::new_v4();
    let rankings = compute_rankings(&[(scored, vec![50.0]), (scoreless, vec![])]);

    let scoreless_row = rankings.iter().find(|r| r.team_id == scoreless).unwrap();
    assert_eq!(scoreless_row.seed_average, None);
    assert_eq!(scoreless_row.tiebreaker, None);
    assert_eq!(scoreless_row.seed_rank, None);
    assert_eq!(scoreless_row.raw_seed_score, None);

    let scored_row = rankings.iter().find(|r| r.team_id == scored).unwrap();
    assert_eq!(scored_row.seed_rank, Some(1));
}

#[test]
fn test_raw_seed_score_values_for_three_ranked_teams() {
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let rankings = compute_rankings(&[
        (a, vec![150.0]),
        (b, vec![120.0]),
        (c, vec![100.0]),
    ]);

    let score_of = |team: Uuid| {
        rankings
            .iter()
            .find(|r| r.team_id == team)
            .unwrap()
            .raw_seed_score
            .unwrap()
    };

    // Top-ranked team always lands exactly at 1.0.
    assert!((score_of(a) - 1.0).abs() < 1e-9);
    assert!((score_of(b) - 0.7).abs() < 1e-9);
    assert!((score_of(c) - 0.416_666_666_7).abs() < 1e-9);
}

#[test]
fn test_ordering_by_average_then_tiebreaker() {
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    // a and b tie on average (two top scores each); b has the better
    // third-highest score.
    let rankings = compute_rankings(&[
        (a, vec![100.0, 90.0, 10.0]),
        (b, vec![100.0, 90.0, 50.0]),
        (c, vec![80.0]),
    ]);

    let rank_of = |team: Uuid| {
        rankings
            .iter()
            .find(|r| r.team_id == team)
            .unwrap()
            .seed_rank
            .unwrap()
    };

    assert_eq!(rank_of(b), 1);
    assert_eq!(rank_of(a), 2);
    assert_eq!(rank_of(c), 3);
}

#[test]
fn test_zero_max_average_guard() {
    let team = Uuid::new_v4();
    let rankings = compute_rankings(&[(team, vec![0.0, 0.0])]);

    assert_eq!(rankings[0].seed_average, Some(0.0));
    assert_eq!(rankings[0].seed_rank, Some(1));
    // With a zero top average only the position component contributes.
    assert_eq!(rankings[0].raw_seed_score, Some(0.75));
}

#[test]
fn test_every_team_gets_a_row() {
    let teams: Vec<(Uuid, Vec<f64>)> = (0..5)
        .map(|i| {
            let scores = if i % 2 == 0 { vec![i as f64 * 10.0 + 1.0] } else { vec![] };
            (Uuid::new_v4(), scores)
        })
        .collect();
    let rankings = compute_rankings(&teams);

    assert_eq!(rankings.len(), 5);
    let ranked = rankings.iter().filter(|r| r.seed_rank.is_some()).count();
    assert_eq!(ranked, 3);
}
