use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use squava::{
    config::BestChildCriteria,
    policy::{RandomPlayout, StandardPolicy, Ucb1Policy},
    Board, Coord, Engine, GameResult, Mcts, MctsConfig, Player, SquavaState,
};
use std::time::Duration;

fn winning_position() -> SquavaState {
    // X can complete the top row at (0, 2).
    let board = Board::from_rows(&["XX.X.", ".....", "..O..", ".....", "O...O"]).unwrap();
    SquavaState::from_board(board, Player::Min)
}

#[test]
fn test_mcts_basic_functionality() {
    let config = MctsConfig::default()
        .with_max_iterations(100)
        .with_symmetry_pruning(false)
        .with_seed(1);
    let mut mcts = Mcts::new(config).unwrap();

    let outcome = mcts.search().unwrap();
    assert!(outcome.best.is_some());
    assert!((0..=1000).contains(&outcome.score));
    assert_eq!(outcome.leaves, 100);

    let stats = mcts.get_statistics();
    assert_eq!(stats.iterations, 100);
    assert!(stats.tree_size > 1, "Tree should have grown");
    assert!(!stats.stopped_early);
}

#[test]
fn test_mcts_finds_winning_move() {
    for criteria in [BestChildCriteria::MostVisits, BestChildCriteria::HighestValue] {
        let config = MctsConfig::default()
            .with_max_iterations(20_000)
            .with_best_child_criteria(criteria)
            .with_seed(42);
        let mut mcts = Mcts::from_state(winning_position(), config).unwrap();
        let outcome = mcts.search().unwrap();
        assert_eq!(outcome.best, Some(Coord::new(0, 2)), "{:?}", criteria);
        assert_eq!(outcome.score, 1000, "{:?}", criteria);
    }
}

#[test]
fn test_mcts_is_reproducible_with_seed() {
    let config = MctsConfig::default().with_max_iterations(2_000).with_seed(7);
    let first = Mcts::new(config.clone()).unwrap().search().unwrap();
    let second = Mcts::new(config).unwrap().search().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_mcts_policy_customization() {
    let config = MctsConfig::default().with_max_iterations(200).with_seed(3);
    let mut mcts = Mcts::new(config)
        .unwrap()
        .with_selection_policy(Ucb1Policy::new(0.1))
        .with_simulation_policy(RandomPlayout::new())
        .with_backpropagation_policy(StandardPolicy::new());
    assert!(mcts.search().is_ok());
}

#[test]
fn test_mcts_reuses_subtree_after_moves() {
    let config = MctsConfig::default()
        .with_max_iterations(3_000)
        .with_symmetry_pruning(false)
        .with_seed(5);
    let mut mcts = Mcts::new(config).unwrap();
    let chosen = mcts.choose_move().unwrap().best.unwrap();

    let tree = mcts.tree().unwrap();
    let root = tree.get(tree.root());
    assert_eq!(root.mv, Some(chosen));
    assert_eq!(root.parent, None);
    assert_eq!(root.depth, 0);
    assert_eq!(root.player_just_moved, Player::Max);

    // Answer with the reply the search explored most.
    let reply = root
        .children
        .iter()
        .max_by_key(|&&child| tree.get(child).visits)
        .and_then(|&child| tree.get(child).mv)
        .unwrap();
    let kept = tree.get(tree.find_child(tree.root(), reply).unwrap()).visits;
    mcts.make_move(reply, Player::Min);

    let tree = mcts.tree().unwrap();
    assert_eq!(tree.get(tree.root()).mv, Some(reply));
    assert_eq!(tree.get(tree.root()).visits, kept);

    mcts.search().unwrap();
    let stats = mcts.get_statistics();
    assert!(stats.reused_nodes > 0);
    let tree = mcts.tree().unwrap();
    assert_eq!(tree.get(tree.root()).visits, kept + 3_000);
}

#[test]
fn test_mcts_drops_tree_for_unexplored_reply() {
    let config = MctsConfig::default()
        .with_max_iterations(30)
        .with_symmetry_pruning(false)
        .with_seed(8);
    let mut mcts = Mcts::new(config).unwrap();
    mcts.choose_move().unwrap();

    let tree = mcts.tree().unwrap();
    let unexplored = mcts
        .board()
        .empty_cells()
        .iter()
        .find(|&cell| tree.find_child(tree.root(), cell).is_none())
        .unwrap();
    mcts.make_move(unexplored, Player::Min);
    assert!(mcts.tree().is_none());

    mcts.search().unwrap();
    assert_eq!(mcts.get_statistics().reused_nodes, 0);
}

#[test]
fn test_mcts_time_limit() {
    let config = MctsConfig::default()
        .with_max_iterations(usize::MAX)
        .with_max_time(Duration::from_millis(50))
        .with_seed(2);
    let mut mcts = Mcts::new(config).unwrap();
    let outcome = mcts.search().unwrap();
    assert!(outcome.best.is_some());
    let stats = mcts.get_statistics();
    assert!(stats.stopped_early);
    assert!(stats.total_time >= Duration::from_millis(50));
}

#[test]
fn test_mcts_finished_game_gives_sentinel() {
    let mut mcts = Mcts::new(MctsConfig::default().with_seed(1)).unwrap();
    for &(r, c) in &[(1, 0), (1, 1), (1, 2)] {
        mcts.make_move(Coord::new(r, c), Player::Min);
    }
    assert_eq!(mcts.find_winner(), Some(Player::Max));
    assert_eq!(mcts.state().outcome(), Some(GameResult::Won(Player::Max)));
    let outcome = mcts.choose_move().unwrap();
    assert_eq!(outcome.best, None);
    assert_eq!(mcts.board().filled(), 3);
}

/// Plays UCT as Max against uniformly random moves and returns Max's score
fn score_against_random(iterations: usize, games: u64) -> f64 {
    let mut total = 0.0;
    for game in 0..games {
        let config = MctsConfig::default()
            .with_max_iterations(iterations)
            .with_seed(game);
        let mut mcts = Mcts::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(1000 + game);
        while !mcts.state().is_terminal() {
            mcts.choose_move().unwrap();
            if mcts.state().is_terminal() {
                break;
            }
            let moves = mcts.state().legal_moves();
            let &reply = moves.as_slice().choose(&mut rng).unwrap();
            mcts.make_move(reply, Player::Min);
        }
        total += mcts.state().result_for(Player::Max);
    }
    total / games as f64
}

#[test]
#[ignore = "plays many full games; run with --ignored"]
fn test_more_iterations_play_better() {
    let weak = score_against_random(50, 40);
    let strong = score_against_random(5_000, 40);
    assert!(strong >= weak, "strong {} < weak {}", strong, weak);
    assert!(strong > 0.7, "strong only scored {}", strong);
}

#[test]
fn test_iterations_improve_play_quickly() {
    let weak = score_against_random(5, 12);
    let strong = score_against_random(400, 12);
    assert!(strong >= weak, "strong {} < weak {}", strong, weak);
    assert!(strong > 0.6, "strong only scored {}", strong);
}
