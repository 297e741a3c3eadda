//! itag → format attributes.

/// Attributes of one encoding variant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormatProfile {
    pub itag: u32,
    pub resolution: &'static str,
    pub bitrate: &'static str,
    pub is_3d: bool,
    pub is_live: bool,
    pub is_60fps: bool,
}

/// `(itag, resolution, bitrate)`; empty strings mean "not applicable".
const ITAGS: &[(u32, &str, &str)] = &[
    (5, "240p", "64kbps"),
    (6, "270p", "64kbps"),
    (13, "144p", ""),
    (17, "144p", "24kbps"),
    (18, "360p", "96kbps"),
    (22, "720p", "192kbps"),
    (34, "360p", "128kbps"),
    (35, "480p", "128kbps"),
    (36, "240p", ""),
    (37, "1080p", "192kbps"),
    (38, "3072p", "192kbps"),
    (43, "360p", "128kbps"),
    (44, "480p", "128kbps"),
    (45, "720p", "192kbps"),
    (46, "1080p", "192kbps"),
    (59, "480p", "128kbps"),
    (78, "480p", "128kbps"),
    (82, "360p", "128kbps"),
    (83, "480p", "128kbps"),
    (84, "720p", "192kbps"),
    (85, "1080p", "192kbps"),
    (91, "144p", "48kbps"),
    (92, "240p", "48kbps"),
    (93, "360p", "128kbps"),
    (94, "480p", "128kbps"),
    (95, "720p", "256kbps"),
    (96, "1080p", "256kbps"),
    (100, "360p", "128kbps"),
    (101, "480p", "192kbps"),
    (102, "720p", "192kbps"),
    (132, "240p", "48kbps"),
    (151, "720p", "24kbps"),
    // DASH video
    (133, "240p", ""),
    (134, "360p", ""),
    (135, "480p", ""),
    (136, "720p", ""),
    (137, "1080p", ""),
    (138, "2160p", ""),
    (160, "144p", ""),
    (167, "360p", ""),
    (168, "480p", ""),
    (169, "720p", ""),
    (170, "1080p", ""),
    (212, "480p", ""),
    (218, "480p", ""),
    (219, "480p", ""),
    (242, "240p", ""),
    (243, "360p", ""),
    (244, "480p", ""),
    (245, "480p", ""),
    (246, "480p", ""),
    (247, "720p", ""),
    (248, "1080p", ""),
    (264, "144p", ""),
    (266, "2160p", ""),
    (271, "144p", ""),
    (272, "2160p", ""),
    (278, "144p", ""),
    (298, "720p", ""),
    (299, "1080p", ""),
    (302, "720p", ""),
    (303, "1080p", ""),
    (308, "1440p", ""),
    (313, "2160p", ""),
    (315, "2160p", ""),
    // DASH audio
    (139, "", "48kbps"),
    (140, "", "128kbps"),
    (141, "", "256kbps"),
    (171, "", "128kbps"),
    (172, "", "256kbps"),
    (249, "", "50kbps"),
    (250, "", "70kbps"),
    (251, "", "160kbps"),
    (256, "", ""),
    (258, "", ""),
    (325, "", ""),
    (328, "", ""),
];

const ITAGS_60FPS: [u32; 6] = [298, 299, 302, 303, 308, 315];
const ITAGS_3D: [u32; 7] = [82, 83, 84, 85, 100, 101, 102];
const ITAGS_LIVE: [u32; 8] = [91, 92, 93, 94, 95, 96, 132, 151];

/// Unknown itags get empty attributes and all flags off.
pub fn format_profile(itag: u32) -> FormatProfile {
    let (resolution, bitrate) = ITAGS
        .iter()
        .find(|(id, _, _)| *id == itag)
        .map(|(_, res, br)| (*res, *br))
        .unwrap_or(("", ""));

    FormatProfile {
        itag,
        resolution,
        bitrate,
        is_3d: ITAGS_3D.contains(&itag),
        is_live: ITAGS_LIVE.contains(&itag),
        is_60fps: ITAGS_60FPS.contains(&itag),
    }
}
