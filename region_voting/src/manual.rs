/*!

This is the long-form manual for `region_voting` and `regionvote`.

## Boundary files

Regions are read from a GeoJSON `FeatureCollection`. Each feature must carry:
* a parent area attribute (`NAME_1` by default). Only the features whose parent area
  matches the configured value (`Attica` by default) are kept.
* an identifier attribute (`GID_3` by default), unique among the kept features.
* a `Polygon` or `MultiPolygon` geometry.

A name attribute (`NAME_3` by default) is optional. The defaults follow the
layout of the GADM level 3 files, for example `gadm41_GRC_3.json`.

If the file cannot be read, or if any of the features above is malformed, the
program stops before accepting any vote. A parent area that matches no feature
is not an error: the session starts, but every vote is rejected.

Coordinates in boundary files are in (longitude, latitude) order, as
mandated by GeoJSON. Voters' positions are always given as latitude first, then
longitude, on the command line and in the console.

## Attribution

A vote goes to the region that contains the voter. Voters outside of every
region are attributed to the nearest region, using the planar distance in
degrees. When two regions are at the same distance (for example on a shared
border), the region that comes first in the boundary file wins.

## Choice domains

### `yes-no`

Votes are `Yes` or `No` (also `y` and `n`, in any case). A region is filled in
`blue` when it has strictly more `Yes` than `No` votes, in `red` otherwise, and
in `gray` without any vote.

### `safety-rating`

Votes are ratings from `1` (unsafe) to `5` (safe). Other values are rejected.
The fill color follows the mean rating of the region:

| mean         | class     | fill     |
|--------------|-----------|----------|
| no vote      | `neutral` | `blue`   |
| below 3      | `warning` | `yellow` |
| 3 or above   | `safe`    | `green`  |

## Console

`regionvote` reads commands from the standard input, one per line:

```text
locate 37.9838 23.7275
where
vote 4
summary
export choropleth.geojson
quit
```

* `locate LAT LON` sets the position of the voter. `locate off` forgets it, as
  when the geolocation is denied. Votes are rejected until a position is set.
* `where` shows the region of the current position.
* `vote CHOICE` records a vote at the current position.
* `summary` prints the summary of all the regions, in JSON.
* `regions` lists the regions of the catalog.
* `export [PATH]` writes the choropleth map (to the configured output if no
  path is given).
* `help` and `quit` (or `exit`).

Errors are printed and the session goes on. Nothing is saved: all the votes
are lost when the program exits.

## Replaying votes

Votes can be read from CSV files (`--votes`, or `voteSources` in the
configuration). Each row is:

```text
latitude,longitude,choice,voter
37.98,23.72,4,
38.05,23.80,2,10.0.0.7
```

The `voter` column is optional. The header row is optional too: without
`hasHeaders`, the first row is taken as a header only when none of its
latitude, longitude and choice can be read. Rows that cannot be recorded are
reported, counted and skipped.

## Choropleth output

The output is a GeoJSON `FeatureCollection` with one feature per region. Each
feature has the geometry of the region and the following properties: `id`,
`name`, `counts`, `total`, `average` (ratings only), `colorClass`, `fillColor`,
and a `style` object that can be passed as is to Leaflet-based renderers.

## Configuration

All the options can be given in a JSON configuration file (`--config`). Command line
options take precedence over the file.

```json
{
  "boundarySource": {
    "filePath": "gadm41_GRC_3.json",
    "parentAreaProperty": "NAME_1",
    "parentAreaValue": "Attica",
    "idProperty": "GID_3",
    "nameProperty": "NAME_3"
  },
  "choiceDomain": "safetyRating",
  "location": { "latitude": 37.9838, "longitude": 23.7275 },
  "voteSources": [ { "filePath": "votes.csv", "hasHeaders": true } ],
  "outputSettings": {
    "outputPath": "choropleth.geojson",
    "question": "How safe do you feel cycling on public roads?"
  }
}
```

Only `boundarySource.filePath` is mandatory. Relative paths are resolved from
the directory of the configuration file.

 */
