use crate::schema::action::TextAction;
use crate::schema::battle::BattleContext;

pub fn execute(battle: &mut BattleContext, action: &TextAction) -> anyhow::Result<bool> {
    let styled = if let Some(color) = &action.color {
        format!("[{color}] {}", action.text)
    } else {
        action.text.clone()
    };
    battle.push_log(styled);
    Ok(true)
}
