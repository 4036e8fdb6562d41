use crate::domain::events::SimEvent;
use crate::domain::model::{Location, PortId, ShipId};
use crate::domain::ports::EventSink;
use crate::utils::error::{Result, SimError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

/// Walks `position` to `target`, the whole X axis first and then the whole Y
/// axis, one unit per `tick`.
///
/// On cancellation the position stays at the last point reached, which is
/// always on the axis-aligned path and never past the target.
pub async fn move_to(
    ship: ShipId,
    position: &mut Location,
    target: Location,
    destination: PortId,
    tick: Duration,
    sink: &dyn EventSink,
    cancel: &CancellationToken,
) -> Result<()> {
    sink.emit(SimEvent::MovementStarted {
        ship,
        from: *position,
        to: target,
        port: destination,
    });

    for axis in [Axis::X, Axis::Y] {
        step_axis(ship, position, target, axis, tick, sink, cancel).await?;
    }

    sink.emit(SimEvent::MovementFinished { ship, at: *position });
    Ok(())
}

async fn step_axis(
    ship: ShipId,
    position: &mut Location,
    target: Location,
    axis: Axis,
    tick: Duration,
    sink: &dyn EventSink,
    cancel: &CancellationToken,
) -> Result<()> {
    let (current, goal) = match axis {
        Axis::X => (position.x, target.x),
        Axis::Y => (position.y, target.y),
    };
    let direction = (goal - current).signum();
    let mut remaining = current.abs_diff(goal);

    while remaining > 0 {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SimError::Cancelled),
            _ = tokio::time::sleep(tick) => {}
        }

        match axis {
            Axis::X => position.x += direction,
            Axis::Y => position.y += direction,
        }
        remaining -= 1;
        sink.emit(SimEvent::MovementStep { ship, at: *position });
    }

    Ok(())
}
