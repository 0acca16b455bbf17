//! End-to-end cascade scenarios on preset boards

use bubble_pop::{CascadeEngine, GameConfig, GameEvent, GamePhase};

fn start(rows: Vec<Vec<u32>>, moves: u32) -> CascadeEngine {
    let mut engine = CascadeEngine::new();
    let config = GameConfig {
        initial_moves: moves,
        ..GameConfig::default()
    };
    engine.start_game_with_values(config, &rows).unwrap();
    engine
}

fn count(engine: &CascadeEngine, pred: impl Fn(&GameEvent) -> bool) -> usize {
    engine.events().iter().filter(|r| pred(&r.event)).count()
}

#[test]
fn full_board_at_threshold_cascades_outward() {
    let mut engine = start(vec![vec![4; 5]; 5], 10);
    engine.player_tap(2, 2).unwrap();
    engine.run_until_idle();

    let totals = engine.total_stats();
    let pops = count(&engine, |e| matches!(e, GameEvent::PopStarted { .. }));
    assert_eq!(pops as u32, totals.pops);
    // Every neighbor of the center was at the threshold
    assert!(totals.chain_pops >= 4);
    assert_eq!(totals.chain_pops, totals.pops - 1);
    assert_eq!(
        engine.board().moves_remaining(),
        10 - 1 + totals.chain_pops
    );
    assert!(engine.board().cells().iter().all(|c| c.value <= 4));
    assert!(engine.is_idle());
    assert_eq!(totals.walks_spawned, 4 * totals.pops);
    assert_eq!(
        totals.walks_spawned,
        totals.walks_resolved + totals.walks_terminated
    );
}

#[test]
fn single_cell_clear_on_last_move_wins() {
    let mut engine = start(vec![vec![4]], 1);
    engine.player_tap(0, 0).unwrap();
    engine.run_until_idle();

    assert_eq!(engine.phase(), GamePhase::Won);
    assert_eq!(engine.board().moves_remaining(), 0);
    assert_eq!(count(&engine, |e| *e == GameEvent::GameWon), 1);
    assert_eq!(count(&engine, |e| *e == GameEvent::GameLost), 0);
}

#[test]
fn drops_spawned_by_one_pop_probe_together() {
    // Center pop; all four neighbors are one step away and filled
    let mut engine = start(vec![vec![1, 1, 1], vec![1, 4, 1], vec![1, 1, 1]], 3);
    engine.player_tap(1, 1).unwrap();
    engine.run_until_idle();

    let landings: Vec<u64> = engine
        .events()
        .iter()
        .filter(|r| {
            matches!(r.event, GameEvent::CellValueChanged { value: 2, .. })
        })
        .map(|r| r.at_ms)
        .collect();
    assert_eq!(landings, vec![500; 4]);
    assert_eq!(
        engine.board().rows(),
        vec![vec![1, 2, 1], vec![2, 0, 2], vec![1, 2, 1]]
    );
}

#[test]
fn chain_generations_are_delay_ordered() {
    // (0,0) pops on tap, its drop pops (0,1) one settle later, which pops (0,2)
    let mut engine = start(vec![vec![4, 4, 4, 1]], 5);
    engine.player_tap(0, 0).unwrap();
    engine.run_until_idle();

    let pop_times: Vec<(usize, u64)> = engine
        .events()
        .iter()
        .filter_map(|r| match r.event {
            GameEvent::PopStarted { col, .. } => Some((col, r.at_ms)),
            _ => None,
        })
        .collect();
    assert_eq!(pop_times, vec![(0, 0), (1, 500), (2, 1000)]);

    // Two chain pops refunded two moves
    assert_eq!(engine.board().moves_remaining(), 5 - 1 + 2);
    // (0,2) dropped right onto (0,3); its left drop bounced over the empty row
    assert_eq!(engine.board().rows(), vec![vec![0, 0, 0, 2]]);
    assert_eq!(engine.phase(), GamePhase::Playing);
}

#[test]
fn cleared_row_is_a_win_with_moves_to_spare() {
    let mut engine = start(vec![vec![4, 4]], 7);
    engine.player_tap(0, 1).unwrap();
    engine.run_until_idle();
    assert_eq!(engine.phase(), GamePhase::Won);
    assert_eq!(engine.board().moves_remaining(), 7);
}

#[test]
fn random_game_is_reproducible_from_seed() {
    let play = |seed: u64| {
        let mut engine = CascadeEngine::new();
        engine
            .start_game(GameConfig {
                seed: Some(seed),
                ..GameConfig::default()
            })
            .unwrap();
        for i in 0..20 {
            if engine.phase() != GamePhase::Playing {
                break;
            }
            engine.player_tap(i % 5, (i * 3) % 5).unwrap();
            engine.run_until_idle();
        }
        (engine.board().rows(), engine.drain_events())
    };
    assert_eq!(play(1234), play(1234));
}
