use helio_core::{Colour, KeySignatureEvent, Note, Project, Scale, TimeSignatureEvent, TrackKind};

/// Track colours handed out in order
pub(super) const PALETTE: [Colour; 6] = [
    Colour::rgb(0x5f, 0xa8, 0xd3),
    Colour::rgb(0xe0, 0x8a, 0x4f),
    Colour::rgb(0x8c, 0xc0, 0x5a),
    Colour::rgb(0xc7, 0x6b, 0xc4),
    Colour::rgb(0xd9, 0xc2, 0x4e),
    Colour::rgb(0x6b, 0xc7, 0xb0),
];

const MELODY: [(i32, f32, f32); 8] = [
    (72, 0.0, 1.0),
    (74, 1.0, 0.5),
    (76, 1.5, 0.5),
    (79, 2.0, 1.5),
    (77, 4.0, 1.0),
    (76, 5.0, 1.0),
    (74, 6.0, 0.5),
    (72, 6.5, 1.5),
];

/// Starting document: key and time signature tracks, a lead and a bass placed twice
pub(super) fn demo_project() -> helio_core::Result<Project> {
    let mut project = Project::new();

    let keys = project.add_track(TrackKind::KeySignatures, "Key Signatures", &mut ());
    project.insert_event(KeySignatureEvent::new(keys, 0.0, 0, Scale::natural_major()).into(), &mut ())?;
    project.insert_event(KeySignatureEvent::new(keys, 16.0, 9, Scale::natural_minor()).into(), &mut ())?;

    let meter = project.add_track(TrackKind::TimeSignatures, "Time Signatures", &mut ());
    project.insert_event(TimeSignatureEvent::new(meter, 0.0, 4, 4).into(), &mut ())?;
    project.insert_event(TimeSignatureEvent::new(meter, 16.0, 3, 4).into(), &mut ())?;

    let lead = project.add_track(TrackKind::Piano, "Lead", &mut ());
    project.set_track_colour(lead, PALETTE[0], &mut ())?;
    for (key, beat, length) in MELODY {
        project.insert_event(Note::new(lead, key, beat, length, 0.6).into(), &mut ())?;
    }

    let bass = project.add_track(TrackKind::Piano, "Bass", &mut ());
    project.set_track_colour(bass, PALETTE[1], &mut ())?;
    for (key, beat) in [(48, 0.0), (43, 2.0), (45, 4.0), (41, 6.0)] {
        project.insert_event(Note::new(bass, key, beat, 2.0, 0.5).into(), &mut ())?;
    }
    project.add_clip(bass, 16.0, &mut ())?;

    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_project_contents() {
        let project = demo_project().unwrap();
        assert_eq!(project.tracks().len(), 4);
        assert_eq!(project.key_signatures().len(), 2);
        assert_eq!(project.time_signatures().len(), 2);
        assert_eq!(project.clips().count(), 3);
        assert_eq!(project.beat_range(), (0.0, 24.0));
    }
}
