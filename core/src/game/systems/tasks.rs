use crate::game::events::GameEvent;
use crate::game::state::GameState;
use crate::{ScheduledTask, TaskKind};

pub(crate) fn execute(task: &ScheduledTask, game: &mut GameState) -> Vec<GameEvent> {
    match task.kind {
        TaskKind::DailyUpkeep => game.process_daily_upkeep(),
        TaskKind::ConstructionComplete(project) => game.complete_construction(project),
        TaskKind::ResearchComplete(project) => game.complete_research(project),
        TaskKind::FarmerRecovery => game.process_farmer_recovery(),
    }
}
